//! Password-based derivation of the AES key and CBC iv.
//!
//! The default [`Kdf::LegacyMd5`] scheme is the one used by existing
//! `Salted__` containers:
//!
//! ```text
//! key = MD5(password || salt)
//! iv  = MD5(key || password || salt)
//! ```
//!
//! It has no work factor and MD5 is long broken as a hash. It is kept only so
//! that containers written by other tools can still be opened.
//! [`Kdf::Argon2id`] is the hardened alternative; it fills the same 32 bytes of
//! key material, so the container layout does not change, but both sides
//! have to agree on it out of band.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use md5::{Digest, Md5};
use zeroize::Zeroize;

use super::{IV_LEN, KEY_LEN, SALT_LEN};
use crate::error::{Error, Result};

/// Key and iv for a single encrypt or decrypt call. Wiped on drop.
pub struct KeyMaterial {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl KeyMaterial {
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.key.zeroize();
        self.iv.zeroize();
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    mem_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            // default memory cost
            mem_cost_kib: 64 * 1024, // 64 MiB
            // default number of iterations
            time_cost: 3,
            // default number of threads
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub fn new(mem_cost_kib: u32, time_cost: u32, parallelism: u32) -> Result<Self> {
        let params = Self {
            mem_cost_kib,
            time_cost,
            parallelism,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn mem_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    pub fn time_cost(&self) -> u32 {
        self.time_cost
    }

    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    pub fn validate(&self) -> Result<()> {
        let invalid =
            |msg: &str| -> Result<()> { Err(Error::InvalidKdfParams(msg.to_string())) };

        if self.mem_cost_kib < 8 {
            return invalid("memory cost too low");
        }
        if self.time_cost < 1 {
            return invalid("time cost must be >= 1");
        }
        if self.parallelism < 1 {
            return invalid("parallelism must be >= 1");
        }
        if self.mem_cost_kib < 8 * self.parallelism {
            return invalid("memory cost must be at least 8 * parallelism");
        }
        Ok(())
    }
}

/// Which derivation turns a password and salt into key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kdf {
    /// Single-round MD5, compatible with `openssl enc -md md5`.
    #[default]
    LegacyMd5,
    /// Argon2id with the given costs; first 16 output bytes are the key, last 16 the iv.
    Argon2id(KdfParams),
}

impl Kdf {
    pub fn derive(&self, password: &[u8], salt: &[u8; SALT_LEN]) -> Result<KeyMaterial> {
        match self {
            Kdf::LegacyMd5 => Ok(derive_key_iv(password, salt)),
            Kdf::Argon2id(params) => derive_argon2(password, salt, *params),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kdf::LegacyMd5 => "legacy-md5",
            Kdf::Argon2id(_) => "argon2id",
        }
    }
}

/// Derive key and iv with the legacy MD5 scheme.
///
/// Pure and deterministic; accepts an empty password.
pub fn derive_key_iv(password: &[u8], salt: &[u8; SALT_LEN]) -> KeyMaterial {
    let key: [u8; KEY_LEN] = Md5::new()
        .chain_update(password)
        .chain_update(salt)
        .finalize()
        .into();

    let iv: [u8; IV_LEN] = Md5::new()
        .chain_update(key)
        .chain_update(password)
        .chain_update(salt)
        .finalize()
        .into();

    KeyMaterial { key, iv }
}

fn derive_argon2(password: &[u8], salt: &[u8; SALT_LEN], kdf: KdfParams) -> Result<KeyMaterial> {
    kdf.validate()?;

    let params = Params::new(
        kdf.mem_cost_kib,
        kdf.time_cost,
        kdf.parallelism,
        Some(KEY_LEN + IV_LEN),
    )
    .map_err(|e| Error::InvalidKdfParams(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut out = [0u8; KEY_LEN + IV_LEN];
    argon2
        .hash_password_into(password, salt, &mut out)
        .map_err(|e| Error::KeyDerivation(e.to_string()))?;

    let mut material = KeyMaterial {
        key: [0u8; KEY_LEN],
        iv: [0u8; IV_LEN],
    };
    material.key.copy_from_slice(&out[..KEY_LEN]);
    material.iv.copy_from_slice(&out[KEY_LEN..]);
    out.zeroize();

    Ok(material)
}
