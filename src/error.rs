use thiserror::Error;

/// Errors returned by every saltseal operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A key or iv of the wrong length reached the cipher.
    #[error("invalid key material: expected {expected} bytes, got {actual}")]
    InvalidKeyMaterial { expected: usize, actual: usize },

    /// CBC padding did not check out after decryption.
    ///
    /// This is what a wrong password looks like.
    #[error("invalid password or corrupted data")]
    Padding,

    #[error("malformed container: {0}")]
    MalformedContainer(String),

    #[error("invalid argon2 parameters: {0}")]
    InvalidKdfParams(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("OS random generator unavailable")]
    Rng,

    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decrypted data is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
