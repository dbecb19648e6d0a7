//! The `Salted__` container format.
//!
//! ```text
//! MAGIC "Salted__" (8) | SALT (8) | CIPHERTEXT (n * 16)
//! ```
//!
//! This is the layout `openssl enc` writes when given a password, so
//! containers are interchangeable with that tool when the legacy KDF is used.

use serde::Serialize;

use crate::{
    crypto::{BLOCK_LEN, SALT_LEN},
    error::{Error, Result},
};

/// Magic bytes at the start of every container ("Salted__").
pub const MAGIC: &[u8; MAGIC_LEN] = b"Salted__";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 8;
/// Smallest input that can hold magic and salt.
pub const MIN_CONTAINER_LEN: usize = MAGIC_LEN + SALT_LEN;

/// How strictly [`Container::parse`] treats the leading eight bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderCheck {
    /// Accept any eight-byte prefix and only use it to locate the salt.
    #[default]
    Lenient,
    /// Reject anything that does not start with [`MAGIC`].
    Strict,
}

/// Public facts about a container, as printed by `saltseal inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerInfo {
    pub standard_magic: bool,
    /// Lowercase hex.
    pub salt: String,
    pub ciphertext_len: usize,
    /// False means no password can decrypt it.
    pub block_aligned: bool,
}

/// A parsed container: magic, salt and the opaque ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    magic: [u8; MAGIC_LEN],
    salt: [u8; SALT_LEN],
    ciphertext: Vec<u8>,
}

impl Container {
    /// Creates a container with the standard magic.
    pub fn new(salt: [u8; SALT_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            magic: *MAGIC,
            salt,
            ciphertext,
        }
    }

    pub fn magic(&self) -> &[u8; MAGIC_LEN] {
        &self.magic
    }

    pub fn has_standard_magic(&self) -> bool {
        &self.magic == MAGIC
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Splits raw bytes into magic, salt and ciphertext.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedContainer`] if:
    /// - The input is shorter than [`MIN_CONTAINER_LEN`]
    /// - `check` is [`HeaderCheck::Strict`] and the magic is wrong
    pub fn parse(data: &[u8], check: HeaderCheck) -> Result<Self> {
        if data.len() < MIN_CONTAINER_LEN {
            return Err(Error::MalformedContainer(format!(
                "need at least {MIN_CONTAINER_LEN} bytes, got {}",
                data.len()
            )));
        }

        let (magic, rest) = data.split_at(MAGIC_LEN);
        let (salt, ciphertext) = rest.split_at(SALT_LEN);

        if check == HeaderCheck::Strict && magic != MAGIC {
            return Err(Error::MalformedContainer("missing Salted__ header".into()));
        }

        let mut container = Self {
            magic: [0u8; MAGIC_LEN],
            salt: [0u8; SALT_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        container.magic.copy_from_slice(magic);
        container.salt.copy_from_slice(salt);

        Ok(container)
    }

    /// Describes the container without deriving any key.
    pub fn info(&self) -> ContainerInfo {
        ContainerInfo {
            standard_magic: self.has_standard_magic(),
            salt: hex::encode(self.salt),
            ciphertext_len: self.ciphertext.len(),
            block_aligned: !self.ciphertext.is_empty() && self.ciphertext.len() % BLOCK_LEN == 0,
        }
    }

    /// Serializes to `magic || salt || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MIN_CONTAINER_LEN + self.ciphertext.len());

        buf.extend_from_slice(&self.magic);
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.ciphertext);

        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_magic_salt_ciphertext() {
        let c = Container::new([9u8; SALT_LEN], vec![1, 2, 3]);
        let bytes = c.to_bytes();

        assert_eq!(bytes.len(), 16 + 3);
        assert_eq!(&bytes[..8], b"Salted__");
        assert_eq!(&bytes[8..16], &[9u8; 8]);
        assert_eq!(&bytes[16..], &[1u8, 2, 3]);
    }

    #[test]
    fn parse_splits_fields() {
        let c = Container::new([4u8; SALT_LEN], vec![0xAA; 32]);
        let parsed = Container::parse(&c.to_bytes(), HeaderCheck::Strict).unwrap();
        assert_eq!(parsed, c);
        assert!(parsed.has_standard_magic());
    }

    #[test]
    fn header_only_has_empty_ciphertext() {
        let parsed = Container::parse(b"Salted__01234567", HeaderCheck::Lenient).unwrap();
        assert_eq!(parsed.salt(), b"01234567");
        assert!(parsed.ciphertext().is_empty());
    }

    #[test]
    fn header_too_short_fails() {
        for len in 0..MIN_CONTAINER_LEN {
            let data = vec![0u8; len];
            assert!(matches!(
                Container::parse(&data, HeaderCheck::Lenient),
                Err(Error::MalformedContainer(_))
            ));
        }
    }

    #[test]
    fn info_reports_public_fields() {
        let c = Container::new([0xAB; SALT_LEN], vec![0u8; 48]);
        let info = c.info();

        assert!(info.standard_magic);
        assert_eq!(info.salt, "abababababababab");
        assert_eq!(info.ciphertext_len, 48);
        assert!(info.block_aligned);

        let truncated = Container::new([0u8; SALT_LEN], vec![0u8; 47]);
        assert!(!truncated.info().block_aligned);
    }

    #[test]
    fn info_serializes_to_json() {
        let c = Container::new([1u8; SALT_LEN], vec![0u8; 16]);
        let json = serde_json::to_value(c.info()).unwrap();

        assert_eq!(json["standard_magic"], true);
        assert_eq!(json["salt"], "0101010101010101");
        assert_eq!(json["ciphertext_len"], 16);
    }

    #[test]
    fn lenient_accepts_foreign_magic() {
        let mut data = vec![0u8; 32];
        data[..8].copy_from_slice(b"NOTSALTY");

        let parsed = Container::parse(&data, HeaderCheck::Lenient).unwrap();
        assert_eq!(parsed.magic(), b"NOTSALTY");
        assert!(!parsed.has_standard_magic());
    }

    #[test]
    fn strict_rejects_foreign_magic() {
        let mut data = vec![0u8; 32];
        data[..8].copy_from_slice(b"NOTSALTY");

        assert!(matches!(
            Container::parse(&data, HeaderCheck::Strict),
            Err(Error::MalformedContainer(_))
        ));
    }
}
