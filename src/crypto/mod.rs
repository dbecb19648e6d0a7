//! Cryptographic primitives for the container.
//!
//! Provides salt generation, password-based key derivation and the
//! AES-128-CBC transform.

pub mod cipher;
pub mod kdf;

pub use cipher::{decrypt, encrypt};
pub use kdf::{Kdf, KdfParams, KeyMaterial, derive_key_iv};

use crate::error::{Error, Result};
use getrandom::fill;

/// Length of the salt (8 bytes).
pub const SALT_LEN: usize = 8;
/// Length of the AES-128 key (16 bytes).
pub const KEY_LEN: usize = 16;
/// Length of the CBC initialization vector (16 bytes).
pub const IV_LEN: usize = 16;
/// AES block size (16 bytes).
pub const BLOCK_LEN: usize = 16;

/// Fill buffer with cryptographically secure random bytes
fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|_| Error::Rng)
}

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}
