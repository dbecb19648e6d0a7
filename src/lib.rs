//! Password-based AES-128-CBC encryption in the `Salted__` container format.
//!
//! A container is `"Salted__" || salt (8) || ciphertext`. The key and iv are
//! derived from the password and the embedded salt, so the password is the
//! only thing the two sides need to share. With the default legacy KDF the
//! output is byte-compatible with `openssl enc -aes-128-cbc -md md5`.
//!
//! ```
//! let sealed = saltseal::encrypt_string("hello, world", "pw")?;
//! assert_eq!(saltseal::decrypt_string(&sealed, "pw")?, "hello, world");
//! # Ok::<(), saltseal::Error>(())
//! ```
//!
//! Every call is self-contained: a fresh salt per encryption, key material
//! dropped (and wiped) before returning, no shared state. A wrong password
//! almost always shows up as [`Error::Padding`].

pub mod crypto;
mod error;
pub mod format;
mod storage;

pub use crate::crypto::{Kdf, KdfParams};
pub use crate::error::{Error, Result};
pub use crate::format::{Container, ContainerInfo, HeaderCheck};
pub use crate::storage::Storage;

use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::debug;
use zeroize::Zeroizing;

/// Knobs for [`seal_with`] and [`open_with`].
///
/// The default is what third-party tools expect: legacy MD5 derivation and a
/// lenient header check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub kdf: Kdf,
    pub header_check: HeaderCheck,
}

impl Options {
    pub fn with_kdf(mut self, kdf: Kdf) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn with_header_check(mut self, header_check: HeaderCheck) -> Self {
        self.header_check = header_check;
        self
    }
}

/// Encrypts `plaintext` under a fresh random salt and returns the container bytes.
pub fn seal(plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
    seal_with(plaintext, password, Options::default())
}

pub fn seal_with(plaintext: &[u8], password: &[u8], options: Options) -> Result<Vec<u8>> {
    let salt = crypto::generate_salt()?;
    seal_with_salt(plaintext, password, salt, options)
}

fn seal_with_salt(
    plaintext: &[u8],
    password: &[u8],
    salt: [u8; crypto::SALT_LEN],
    options: Options,
) -> Result<Vec<u8>> {
    let material = options.kdf.derive(password, &salt)?;
    let ciphertext = crypto::encrypt(material.key(), material.iv(), plaintext)?;
    drop(material);

    let container = Container::new(salt, ciphertext).to_bytes();
    debug!(
        kdf = options.kdf.name(),
        plaintext_len = plaintext.len(),
        container_len = container.len(),
        "sealed container"
    );
    Ok(container)
}

/// Recovers the plaintext from container bytes.
///
/// # Errors
///
/// - [`Error::MalformedContainer`] if the input cannot hold magic and salt;
///   no key derivation happens in that case
/// - [`Error::Padding`] for a wrong password or damaged ciphertext
pub fn open(container: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    open_with(container, password, Options::default())
}

pub fn open_with(
    container: &[u8],
    password: &[u8],
    options: Options,
) -> Result<Zeroizing<Vec<u8>>> {
    let parsed = Container::parse(container, options.header_check)?;

    let material = options.kdf.derive(password, parsed.salt())?;
    let plaintext = crypto::decrypt(material.key(), material.iv(), parsed.ciphertext())?;

    debug!(
        kdf = options.kdf.name(),
        container_len = container.len(),
        plaintext_len = plaintext.len(),
        "opened container"
    );
    Ok(plaintext)
}

pub fn encrypt_bytes(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    seal(plaintext, password.as_bytes())
}

pub fn decrypt_bytes(container: &[u8], password: &str) -> Result<Zeroizing<Vec<u8>>> {
    open(container, password.as_bytes())
}

/// UTF-8 text in, standard padded Base64 of the container out.
pub fn encrypt_string(plaintext: &str, password: &str) -> Result<String> {
    encrypt_string_with(plaintext, password, Options::default())
}

pub fn encrypt_string_with(plaintext: &str, password: &str, options: Options) -> Result<String> {
    let container = seal_with(plaintext.as_bytes(), password.as_bytes(), options)?;
    Ok(STANDARD.encode(container))
}

/// Inverse of [`encrypt_string`].
///
/// Surrounding whitespace in `encoded` is ignored.
pub fn decrypt_string(encoded: &str, password: &str) -> Result<String> {
    decrypt_string_with(encoded, password, Options::default())
}

pub fn decrypt_string_with(encoded: &str, password: &str, options: Options) -> Result<String> {
    let container = STANDARD.decode(encoded.trim())?;
    let plaintext = open_with(&container, password.as_bytes(), options)?;
    Ok(String::from_utf8(plaintext.to_vec())?)
}

/// Encrypts a whole file into a container file.
pub fn encrypt_file(input: &Path, output: &Path, password: &str) -> Result<()> {
    encrypt_file_with(input, output, password, Options::default())
}

pub fn encrypt_file_with(
    input: &Path,
    output: &Path,
    password: &str,
    options: Options,
) -> Result<()> {
    let plaintext = Zeroizing::new(Storage::new(input).load()?);
    let container = seal_with(&plaintext, password.as_bytes(), options)?;
    Storage::new(output).save(&container)
}

/// Decrypts a container file. Nothing is written if decryption fails.
pub fn decrypt_file(input: &Path, output: &Path, password: &str) -> Result<()> {
    decrypt_file_with(input, output, password, Options::default())
}

pub fn decrypt_file_with(
    input: &Path,
    output: &Path,
    password: &str,
    options: Options,
) -> Result<()> {
    let container = Storage::new(input).load()?;
    let plaintext = open_with(&container, password.as_bytes(), options)?;
    Storage::new(output).save(&plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SALT: [u8; crypto::SALT_LEN] = [0, 1, 2, 3, 4, 5, 6, 7];
    const HELLO_CONTAINER_B64: &str = "U2FsdGVkX18AAQIDBAUGBzGKEJVrkn7au3vI8SMm1ic=";

    #[test]
    fn seal_open_roundtrip() {
        let sealed = seal(b"secret data", b"pw").unwrap();
        let plaintext = open(&sealed, b"pw").unwrap();
        assert_eq!(*plaintext, b"secret data");
    }

    #[test]
    fn empty_plaintext_and_empty_password() {
        let sealed = seal(b"", b"").unwrap();
        assert_eq!(sealed.len(), 16 + 16);
        assert!(open(&sealed, b"").unwrap().is_empty());
    }

    #[test]
    fn container_layout() {
        let sealed = seal(b"0123456789abcdefX", b"pw").unwrap();

        assert_eq!(&sealed[..8], format::MAGIC);
        // 17 bytes pad to two blocks
        assert_eq!(sealed.len(), 16 + 32);
    }

    #[test]
    fn fixed_salt_matches_openssl() {
        let sealed = seal_with_salt(b"hello, world", b"pw", SALT, Options::default()).unwrap();
        assert_eq!(STANDARD.encode(&sealed), HELLO_CONTAINER_B64);
    }

    #[test]
    fn decrypt_string_reads_openssl_output() {
        assert_eq!(
            decrypt_string(HELLO_CONTAINER_B64, "pw").unwrap(),
            "hello, world"
        );
    }

    #[test]
    fn fresh_salt_per_seal() {
        let a = seal(b"same", b"pw").unwrap();
        let b = seal(b"same", b"pw").unwrap();

        assert_ne!(a[8..16], b[8..16]);
        assert_ne!(a[16..], b[16..]);
    }

    #[test]
    fn wrong_password_is_padding_error() {
        assert!(matches!(
            decrypt_string(HELLO_CONTAINER_B64, "wrong"),
            Err(Error::Padding)
        ));
    }

    #[test]
    fn short_input_is_malformed() {
        for len in [0, 1, 8, 15] {
            assert!(matches!(
                open(&vec![0u8; len], b"pw"),
                Err(Error::MalformedContainer(_))
            ));
        }
    }

    #[test]
    fn header_only_container_fails_decryption() {
        let header_only = seal(b"x", b"pw").unwrap()[..16].to_vec();
        assert!(matches!(open(&header_only, b"pw"), Err(Error::Padding)));
    }

    #[test]
    fn lenient_header_by_default_strict_on_request() {
        let mut sealed = seal(b"payload", b"pw").unwrap();
        sealed[..8].copy_from_slice(b"XXXXXXXX");

        assert_eq!(*open(&sealed, b"pw").unwrap(), b"payload");

        let strict = Options::default().with_header_check(HeaderCheck::Strict);
        assert!(matches!(
            open_with(&sealed, b"pw", strict),
            Err(Error::MalformedContainer(_))
        ));
    }

    #[test]
    fn string_roundtrip() {
        let enc = encrypt_string("hello, world", "pw").unwrap();
        assert_eq!(decrypt_string(&enc, "pw").unwrap(), "hello, world");
    }

    #[test]
    fn string_roundtrip_non_ascii() {
        let enc = encrypt_string("grüße, 世界", "pässwörd").unwrap();
        assert_eq!(decrypt_string(&enc, "pässwörd").unwrap(), "grüße, 世界");
    }

    #[test]
    fn decrypt_string_rejects_bad_base64() {
        assert!(matches!(
            decrypt_string("not base64!!", "pw"),
            Err(Error::Base64(_))
        ));
    }

    #[test]
    fn decrypt_string_rejects_non_utf8_plaintext() {
        let sealed = seal(&[0xff, 0xfe, 0x00], b"pw").unwrap();
        let encoded = STANDARD.encode(sealed);

        assert!(matches!(decrypt_string(&encoded, "pw"), Err(Error::Utf8(_))));
    }

    #[test]
    fn argon2_options_roundtrip_and_do_not_open_as_legacy() {
        let opts = Options::default().with_kdf(Kdf::Argon2id(KdfParams::new(64, 1, 1).unwrap()));

        let enc = encrypt_string_with("hardened", "pw", opts).unwrap();
        assert_eq!(decrypt_string_with(&enc, "pw", opts).unwrap(), "hardened");
        assert!(decrypt_string(&enc, "pw").map(|s| s != "hardened").unwrap_or(true));
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempdir().unwrap();
        let plain = dir.path().join("config.toml");
        let sealed = dir.path().join("config.toml.enc");
        let restored = dir.path().join("restored.toml");

        std::fs::write(&plain, b"token = \"abc\"\n").unwrap();

        encrypt_file(&plain, &sealed, "pw").unwrap();
        assert_eq!(&std::fs::read(&sealed).unwrap()[..8], b"Salted__");

        decrypt_file(&sealed, &restored, "pw").unwrap();
        assert_eq!(std::fs::read(&restored).unwrap(), b"token = \"abc\"\n");
    }

    #[test]
    fn decrypt_file_wrong_password_writes_nothing() {
        let dir = tempdir().unwrap();
        let sealed = dir.path().join("in.enc");
        let out = dir.path().join("out.txt");

        std::fs::write(&sealed, STANDARD.decode(HELLO_CONTAINER_B64).unwrap()).unwrap();

        assert!(matches!(
            decrypt_file(&sealed, &out, "wrong"),
            Err(Error::Padding)
        ));
        assert!(!out.exists());
    }

    #[test]
    fn missing_input_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = encrypt_file(&dir.path().join("nope"), &dir.path().join("out"), "pw")
            .unwrap_err();

        match err {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io, got: {other:?}"),
        }
    }
}
