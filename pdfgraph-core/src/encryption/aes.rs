//! AES-128-CBC for the `AESV2` crypt method (ISO 32000-1 7.6.2).
//!
//! Ciphertext layout is `IV (16 bytes) || CBC(PKCS#7 padded data)`.

use crate::error::{PdfError, Result};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

pub const AES_BLOCK_SIZE: usize = 16;

/// Fresh IV from the OS random source.
pub fn generate_iv() -> Result<[u8; AES_BLOCK_SIZE]> {
    let mut iv = [0u8; AES_BLOCK_SIZE];
    OsRng.try_fill_bytes(&mut iv)?;
    Ok(iv)
}

/// Encrypt `data` under `key` with the given IV and prefix the IV.
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8; AES_BLOCK_SIZE], data: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|_| PdfError::EncryptionError(format!("invalid AES key length {}", key.len())))?;

    let padded_len = data.len() + AES_BLOCK_SIZE - data.len() % AES_BLOCK_SIZE;
    let mut buf = vec![0u8; padded_len];
    buf[..data.len()].copy_from_slice(data);
    let ciphertext = cipher
        .encrypt_padded_mut::<Pkcs7>(&mut buf, data.len())
        .map_err(|_| PdfError::EncryptionError("AES padding failed".to_string()))?;

    let mut out = Vec::with_capacity(AES_BLOCK_SIZE + ciphertext.len());
    out.extend_from_slice(iv);
    out.extend_from_slice(ciphertext);
    Ok(out)
}

/// Inverse of [`aes_cbc_encrypt`]: split the IV off and strip the padding.
pub fn aes_cbc_decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < AES_BLOCK_SIZE || data.len() % AES_BLOCK_SIZE != 0 {
        return Err(PdfError::EncryptionError(format!(
            "AES data length {} is not a whole number of blocks",
            data.len()
        )));
    }
    let (iv, body) = data.split_at(AES_BLOCK_SIZE);
    let cipher = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|_| PdfError::EncryptionError(format!("invalid AES key length {}", key.len())))?;

    let mut buf = body.to_vec();
    let plain = cipher
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| PdfError::EncryptionError("invalid PKCS#7 padding".to_string()))?;
    Ok(plain.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_iv_is_random() {
        let a = generate_iv().unwrap();
        let b = generate_iv().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = [7u8; 16];
        let iv = [1u8; 16];
        for len in [0usize, 1, 15, 16, 17, 100] {
            let data: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let encrypted = aes_cbc_encrypt(&key, &iv, &data).unwrap();

            assert_eq!(&encrypted[..16], &iv);
            assert_eq!(encrypted.len(), 16 + (len / 16 + 1) * 16);
            assert_eq!(aes_cbc_decrypt(&key, &encrypted).unwrap(), data);
        }
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(aes_cbc_encrypt(&[0u8; 5], &[0u8; 16], b"data").is_err());
    }

    #[test]
    fn test_decrypt_rejects_partial_blocks() {
        assert!(aes_cbc_decrypt(&[0u8; 16], &[0u8; 20]).is_err());
        assert!(aes_cbc_decrypt(&[0u8; 16], &[0u8; 8]).is_err());
    }
}
