//! Standard Security Handler, revisions 2 to 4 (ISO 32000-1 7.6.3).
//!
//! Algorithm numbers in the docs refer to ISO 32000-1: Algorithm 2 derives
//! the file key, Algorithm 3 the `O` entry, Algorithms 4 and 5 the `U`
//! entry, Algorithm 1 the per-object key.

use crate::encryption::aes::{aes_cbc_decrypt, aes_cbc_encrypt, generate_iv};
use crate::encryption::rc4::rc4_crypt;
use crate::encryption::EncryptionAlgorithm;
use crate::error::Result;
use crate::objects::ObjectId;

/// Padding used in password processing
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Security handler revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SecurityHandlerRevision {
    /// Revision 2 (RC4 40-bit)
    R2 = 2,
    /// Revision 3 (RC4 up to 128-bit)
    R3 = 3,
    /// Revision 4 (crypt filters, RC4 or AES-128)
    R4 = 4,
}

/// Cipher applied to strings and streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptMethod {
    /// RC4
    V2,
    /// AES-128-CBC
    AesV2,
}

impl CryptMethod {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            CryptMethod::V2 => "V2",
            CryptMethod::AesV2 => "AESV2",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StandardSecurityHandler {
    revision: SecurityHandlerRevision,
    version: u8,
    /// Key length in bytes
    key_length: usize,
    method: CryptMethod,
    encrypt_metadata: bool,
}

impl StandardSecurityHandler {
    /// V1 / R2, 40-bit RC4
    pub fn rc4_40bit() -> Self {
        Self {
            revision: SecurityHandlerRevision::R2,
            version: 1,
            key_length: 5,
            method: CryptMethod::V2,
            encrypt_metadata: true,
        }
    }

    /// V2 / R3, 128-bit RC4
    pub fn rc4_128bit() -> Self {
        Self {
            revision: SecurityHandlerRevision::R3,
            version: 2,
            key_length: 16,
            method: CryptMethod::V2,
            encrypt_metadata: true,
        }
    }

    /// V4 / R4, AES-128 through the `StdCF` crypt filter
    pub fn aes_128bit() -> Self {
        Self {
            revision: SecurityHandlerRevision::R4,
            version: 4,
            key_length: 16,
            method: CryptMethod::AesV2,
            encrypt_metadata: true,
        }
    }

    pub fn for_algorithm(algorithm: EncryptionAlgorithm) -> Self {
        match algorithm {
            EncryptionAlgorithm::Rc4_40 => Self::rc4_40bit(),
            EncryptionAlgorithm::Rc4_128 => Self::rc4_128bit(),
            EncryptionAlgorithm::Aes128 => Self::aes_128bit(),
        }
    }

    /// Only honoured by revision 4; earlier revisions always encrypt metadata.
    pub fn with_encrypt_metadata(mut self, encrypt_metadata: bool) -> Self {
        self.encrypt_metadata =
            encrypt_metadata || self.revision < SecurityHandlerRevision::R4;
        self
    }

    pub fn revision(&self) -> SecurityHandlerRevision {
        self.revision
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn method(&self) -> CryptMethod {
        self.method
    }

    pub fn encrypt_metadata(&self) -> bool {
        self.encrypt_metadata
    }

    /// Pad or truncate password to 32 bytes
    fn pad_password(password: &[u8]) -> [u8; 32] {
        let mut padded = [0u8; 32];
        let len = password.len().min(32);

        padded[..len].copy_from_slice(&password[..len]);
        if len < 32 {
            padded[len..].copy_from_slice(&PADDING[..32 - len]);
        }

        padded
    }

    /// RC4 key length used by Algorithms 2 and 3.
    fn rc4_key_length(&self) -> usize {
        if self.revision == SecurityHandlerRevision::R2 {
            5
        } else {
            self.key_length
        }
    }

    /// Apply RC4 once with `key`, then for revision 3+ nineteen more times
    /// with each key byte XORed by the pass number.
    fn rc4_iterated(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
        let mut result = rc4_crypt(key, data);
        if self.revision >= SecurityHandlerRevision::R3 {
            for i in 1..=19u8 {
                let iter_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                result = rc4_crypt(&iter_key, &result);
            }
        }
        result
    }

    /// Algorithm 3: the `O` entry.
    pub fn compute_owner_hash(&self, owner_password: &[u8], user_password: &[u8]) -> Vec<u8> {
        let owner = if owner_password.is_empty() {
            user_password
        } else {
            owner_password
        };

        let mut hash = md5::compute(Self::pad_password(owner)).0;
        if self.revision >= SecurityHandlerRevision::R3 {
            for _ in 0..50 {
                hash = md5::compute(hash).0;
            }
        }

        let key = &hash[..self.rc4_key_length()];
        self.rc4_iterated(key, &Self::pad_password(user_password))
    }

    /// Algorithm 2: the file encryption key.
    pub fn compute_encryption_key(
        &self,
        user_password: &[u8],
        owner_hash: &[u8],
        permissions: i32,
        file_id: &[u8],
    ) -> Vec<u8> {
        let mut context = md5::Context::new();
        context.consume(Self::pad_password(user_password));
        context.consume(owner_hash);
        context.consume((permissions as u32).to_le_bytes());
        context.consume(file_id);
        if self.revision >= SecurityHandlerRevision::R4 && !self.encrypt_metadata {
            context.consume([0xFF, 0xFF, 0xFF, 0xFF]);
        }
        let mut hash = context.finalize().0;

        let n = self.rc4_key_length();
        if self.revision >= SecurityHandlerRevision::R3 {
            for _ in 0..50 {
                hash = md5::compute(&hash[..n]).0;
            }
        }

        hash[..n].to_vec()
    }

    /// Algorithms 4 (revision 2) and 5 (revision 3+): returns the `U` entry
    /// together with the file key it was derived from.
    pub fn compute_user_hash(
        &self,
        user_password: &[u8],
        owner_hash: &[u8],
        permissions: i32,
        file_id: &[u8],
    ) -> (Vec<u8>, Vec<u8>) {
        let key = self.compute_encryption_key(user_password, owner_hash, permissions, file_id);

        let user_hash = match self.revision {
            SecurityHandlerRevision::R2 => rc4_crypt(&key, &PADDING),
            SecurityHandlerRevision::R3 | SecurityHandlerRevision::R4 => {
                let mut context = md5::Context::new();
                context.consume(PADDING);
                context.consume(file_id);
                let hash = context.finalize().0;

                let mut result = self.rc4_iterated(&key, &hash);
                // 16 bytes of hash followed by 16 arbitrary padding bytes
                result.resize(32, 0);
                result
            }
        };

        (user_hash, key)
    }

    /// Algorithm 6: returns the file key when `password` is the user password.
    pub fn authenticate_user_password(
        &self,
        password: &[u8],
        owner_hash: &[u8],
        user_hash: &[u8],
        permissions: i32,
        file_id: &[u8],
    ) -> Option<Vec<u8>> {
        let (computed, key) = self.compute_user_hash(password, owner_hash, permissions, file_id);
        let significant = match self.revision {
            SecurityHandlerRevision::R2 => 32,
            _ => 16,
        };
        if user_hash.len() >= significant && computed[..significant] == user_hash[..significant] {
            Some(key)
        } else {
            None
        }
    }

    /// Algorithm 1: key for one object, from the low three bytes of the
    /// object number and the low two bytes of the generation.
    pub fn compute_object_key(&self, file_key: &[u8], obj_id: ObjectId) -> Vec<u8> {
        let mut context = md5::Context::new();
        context.consume(file_key);
        context.consume(&obj_id.number().to_le_bytes()[..3]);
        context.consume(&obj_id.generation().to_le_bytes()[..2]);
        if self.method == CryptMethod::AesV2 {
            context.consume(b"sAlT");
        }
        let hash = context.finalize().0;

        let key_len = (file_key.len() + 5).min(16);
        hash[..key_len].to_vec()
    }

    /// Encrypt the bytes of a string or stream belonging to `obj_id`.
    pub fn encrypt_bytes(&self, file_key: &[u8], obj_id: ObjectId, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.compute_object_key(file_key, obj_id);
        match self.method {
            CryptMethod::V2 => Ok(rc4_crypt(&key, data)),
            CryptMethod::AesV2 => {
                let iv = generate_iv()?;
                aes_cbc_encrypt(&key, &iv, data)
            }
        }
    }

    pub fn decrypt_bytes(&self, file_key: &[u8], obj_id: ObjectId, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.compute_object_key(file_key, obj_id);
        match self.method {
            CryptMethod::V2 => Ok(rc4_crypt(&key, data)),
            CryptMethod::AesV2 => aes_cbc_decrypt(&key, data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE_ID: [u8; 16] = [
        0x5a, 0x1b, 0x93, 0x00, 0xfe, 0x12, 0x44, 0x87, 0x09, 0xaa, 0x31, 0x6c, 0x72, 0x0d, 0xe4,
        0x58,
    ];

    #[test]
    fn test_pad_password() {
        let padded = StandardSecurityHandler::pad_password(b"test");
        assert_eq!(&padded[..4], b"test");
        assert_eq!(&padded[4..], &PADDING[..28]);

        let empty = StandardSecurityHandler::pad_password(b"");
        assert_eq!(empty, PADDING);
    }

    #[test]
    fn test_pad_password_long() {
        let long_password = [b'a'; 40];
        let padded = StandardSecurityHandler::pad_password(&long_password);
        assert_eq!(&padded[..], &long_password[..32]);
    }

    #[test]
    fn test_handler_presets() {
        let h = StandardSecurityHandler::rc4_40bit();
        assert_eq!((h.version(), h.revision(), h.key_length()), (1, SecurityHandlerRevision::R2, 5));

        let h = StandardSecurityHandler::rc4_128bit();
        assert_eq!((h.version(), h.revision(), h.key_length()), (2, SecurityHandlerRevision::R3, 16));

        let h = StandardSecurityHandler::aes_128bit();
        assert_eq!(h.method(), CryptMethod::AesV2);
        assert_eq!(h.revision(), SecurityHandlerRevision::R4);
    }

    #[test]
    fn test_owner_hash_length_and_determinism() {
        for handler in [
            StandardSecurityHandler::rc4_40bit(),
            StandardSecurityHandler::rc4_128bit(),
            StandardSecurityHandler::aes_128bit(),
        ] {
            let a = handler.compute_owner_hash(b"owner", b"user");
            let b = handler.compute_owner_hash(b"owner", b"user");
            assert_eq!(a.len(), 32);
            assert_eq!(a, b);
            assert_ne!(a, handler.compute_owner_hash(b"other", b"user"));
        }
    }

    #[test]
    fn test_empty_owner_password_falls_back_to_user() {
        let handler = StandardSecurityHandler::rc4_128bit();
        assert_eq!(
            handler.compute_owner_hash(b"", b"user"),
            handler.compute_owner_hash(b"user", b"user")
        );
    }

    #[test]
    fn test_user_hash_is_deterministic() {
        let handler = StandardSecurityHandler::rc4_128bit();
        let o = handler.compute_owner_hash(b"owner", b"user");

        let (u1, k1) = handler.compute_user_hash(b"user", &o, -1, &FILE_ID);
        let (u2, k2) = handler.compute_user_hash(b"user", &o, -1, &FILE_ID);
        assert_eq!(u1, u2);
        assert_eq!(k1, k2);
        assert_eq!(u1.len(), 32);
        assert_eq!(k1.len(), 16);
    }

    #[test]
    fn test_user_hash_depends_on_inputs() {
        let handler = StandardSecurityHandler::rc4_128bit();
        let o = handler.compute_owner_hash(b"owner", b"user");
        let (_, k1) = handler.compute_user_hash(b"user", &o, -1, &FILE_ID);
        let (_, k2) = handler.compute_user_hash(b"user", &o, -4, &FILE_ID);
        let (_, k3) = handler.compute_user_hash(b"user", &o, -1, &[0u8; 16]);
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
    }

    #[test]
    fn test_r2_key_is_40_bits() {
        let handler = StandardSecurityHandler::rc4_40bit();
        let o = handler.compute_owner_hash(b"", b"");
        let (u, key) = handler.compute_user_hash(b"", &o, -1, &FILE_ID);
        assert_eq!(key.len(), 5);
        assert_eq!(u, rc4_crypt(&key, &PADDING));
    }

    #[test]
    fn test_authenticate_user_password() {
        for handler in [
            StandardSecurityHandler::rc4_40bit(),
            StandardSecurityHandler::rc4_128bit(),
            StandardSecurityHandler::aes_128bit(),
        ] {
            let o = handler.compute_owner_hash(b"secret", b"reader");
            let (u, key) = handler.compute_user_hash(b"reader", &o, -3904, &FILE_ID);

            assert_eq!(
                handler.authenticate_user_password(b"reader", &o, &u, -3904, &FILE_ID),
                Some(key)
            );
            assert_eq!(
                handler.authenticate_user_password(b"wrong", &o, &u, -3904, &FILE_ID),
                None
            );
        }
    }

    #[test]
    fn test_encrypt_metadata_changes_r4_key_only() {
        let o = [0u8; 32];
        let r4 = StandardSecurityHandler::aes_128bit();
        let r4_plain_meta = StandardSecurityHandler::aes_128bit().with_encrypt_metadata(false);
        assert_ne!(
            r4.compute_encryption_key(b"u", &o, -1, &FILE_ID),
            r4_plain_meta.compute_encryption_key(b"u", &o, -1, &FILE_ID)
        );

        let r3 = StandardSecurityHandler::rc4_128bit().with_encrypt_metadata(false);
        assert!(r3.encrypt_metadata());
    }

    #[test]
    fn test_object_key_length() {
        let rc4_40 = StandardSecurityHandler::rc4_40bit();
        assert_eq!(rc4_40.compute_object_key(&[1; 5], ObjectId::new(1, 0)).len(), 10);

        let rc4_128 = StandardSecurityHandler::rc4_128bit();
        let k1 = rc4_128.compute_object_key(&[1; 16], ObjectId::new(1, 0));
        let k2 = rc4_128.compute_object_key(&[1; 16], ObjectId::new(2, 0));
        assert_eq!(k1.len(), 16);
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_object_key_uses_low_three_bytes_of_number() {
        let handler = StandardSecurityHandler::rc4_128bit();
        let key = [9u8; 16];
        assert_eq!(
            handler.compute_object_key(&key, ObjectId::new(0x01_000001, 0)),
            handler.compute_object_key(&key, ObjectId::new(0x00_000001, 0))
        );
    }

    #[test]
    fn test_rc4_bytes_roundtrip() {
        let handler = StandardSecurityHandler::rc4_128bit();
        let key = [3u8; 16];
        let id = ObjectId::new(12, 0);
        let data = b"BT /F1 12 Tf (secret) Tj ET";

        let encrypted = handler.encrypt_bytes(&key, id, data).unwrap();
        assert_eq!(encrypted.len(), data.len());
        assert_ne!(&encrypted[..], &data[..]);
        assert_eq!(handler.decrypt_bytes(&key, id, &encrypted).unwrap(), data);
    }

    #[test]
    fn test_aes_bytes_roundtrip() {
        let handler = StandardSecurityHandler::aes_128bit();
        let key = [3u8; 16];
        let id = ObjectId::new(12, 0);
        let data = b"BT /F1 12 Tf (secret) Tj ET";

        let encrypted = handler.encrypt_bytes(&key, id, data).unwrap();
        assert_eq!(encrypted.len(), 16 + 32);
        assert_eq!(handler.decrypt_bytes(&key, id, &encrypted).unwrap(), data);

        // another object cannot decrypt it
        let other = handler.decrypt_bytes(&key, ObjectId::new(13, 0), &encrypted);
        assert!(other.map(|d| d != data).unwrap_or(true));
    }
}
