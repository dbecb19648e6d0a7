use aes::Aes128;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use zeroize::Zeroizing;

use super::{BLOCK_LEN, IV_LEN, KEY_LEN};
use crate::error::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

fn check_len(material: &[u8], expected: usize) -> Result<()> {
    if material.len() != expected {
        return Err(Error::InvalidKeyMaterial {
            expected,
            actual: material.len(),
        });
    }
    Ok(())
}

/// Encrypt plaintext with AES-128-CBC and PKCS#7 padding.
///
/// The output is always a non-empty multiple of 16 bytes; an empty plaintext
/// becomes one full padding block.
pub fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    check_len(key, KEY_LEN)?;
    check_len(iv, IV_LEN)?;

    let cipher = Aes128CbcEnc::new(key.into(), iv.into());
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt ciphertext
///
/// # Errors
///
/// Returns [`Error::Padding`] if the ciphertext is empty, not block aligned,
/// or ends in inconsistent padding.
pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    check_len(key, KEY_LEN)?;
    check_len(iv, IV_LEN)?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(Error::Padding);
    }

    let cipher = Aes128CbcDec::new(key.into(), iv.into());
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Padding)?;
    Ok(Zeroizing::new(plaintext))
}
