//! PDF encryption support according to ISO 32000-1 Chapter 7.6
//!
//! Standard Security Handler revisions 2, 3 and 4: RC4 40-bit, RC4 128-bit
//! and AES-128 through the `StdCF` crypt filter. Only the writing direction
//! is used by the crate; decryption helpers exist so output can be verified.

mod aes;
mod encryption_dict;
mod object_encryption;
mod permissions;
mod rc4;
mod standard_security;

pub use aes::{aes_cbc_decrypt, aes_cbc_encrypt, generate_iv, AES_BLOCK_SIZE};
pub use encryption_dict::{CryptFilter, EncryptionDictionary, STANDARD_CRYPT_FILTER};
pub use object_encryption::{generate_file_ids, SecurityState};
pub use permissions::Permissions;
pub use rc4::{rc4_crypt, Rc4};
pub use standard_security::{
    CryptMethod, SecurityHandlerRevision, StandardSecurityHandler, PADDING,
};

/// Cipher and key size of the Standard handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionAlgorithm {
    /// RC4 40-bit (V1, R2)
    Rc4_40,
    /// RC4 128-bit (V2, R3)
    #[default]
    Rc4_128,
    /// AES-128 (V4, R4, `AESV2` crypt filter)
    Aes128,
}

/// Options for [`PdfWriter::encrypt`](crate::writer::PdfWriter::encrypt).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptOptions {
    pub permissions: Permissions,
    pub algorithm: EncryptionAlgorithm,
    /// Only meaningful for [`EncryptionAlgorithm::Aes128`].
    pub encrypt_metadata: bool,
}

impl Default for EncryptOptions {
    /// Every bit set, so `P` is -1.
    fn default() -> Self {
        Self {
            permissions: Permissions::from_bits_retain(u32::MAX),
            algorithm: EncryptionAlgorithm::Rc4_128,
            encrypt_metadata: true,
        }
    }
}

impl EncryptOptions {
    /// The `P` value written for these options.
    pub fn p_value(&self) -> i32 {
        self.permissions.p_value()
    }
}
