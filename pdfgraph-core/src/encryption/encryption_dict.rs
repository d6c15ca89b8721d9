//! The `Encrypt` dictionary written to the trailer of an encrypted file.

use crate::encryption::standard_security::{CryptMethod, StandardSecurityHandler};
use crate::objects::{Dictionary, Object};

/// Name of the single crypt filter used by revision 4
pub const STANDARD_CRYPT_FILTER: &str = "StdCF";

/// Crypt filter definition
#[derive(Debug, Clone)]
pub struct CryptFilter {
    pub method: CryptMethod,
    /// Length in bytes
    pub length: u32,
}

impl CryptFilter {
    pub fn to_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("CryptFilter"));
        dict.set("CFM", Object::name(self.method.pdf_name()));
        dict.set("AuthEvent", Object::name("DocOpen"));
        dict.set("Length", Object::Integer(self.length as i64));
        dict
    }
}

/// PDF encryption dictionary for the Standard handler
#[derive(Debug, Clone)]
pub struct EncryptionDictionary {
    /// Algorithm version (1, 2 or 4)
    pub v: u32,
    /// Revision number (2 to 4)
    pub r: u32,
    /// Key length in bytes
    pub length: u32,
    /// Owner password hash (32 bytes)
    pub o: Vec<u8>,
    /// User password hash (32 bytes)
    pub u: Vec<u8>,
    pub p: i32,
    /// Only present for revision 4
    pub cf: Option<CryptFilter>,
    pub encrypt_metadata: bool,
}

impl EncryptionDictionary {
    pub fn new(handler: &StandardSecurityHandler, o: Vec<u8>, u: Vec<u8>, p: i32) -> Self {
        let cf = (handler.version() >= 4).then(|| CryptFilter {
            method: handler.method(),
            length: handler.key_length() as u32,
        });

        Self {
            v: handler.version() as u32,
            r: handler.revision() as u32,
            length: handler.key_length() as u32,
            o,
            u,
            p,
            cf,
            encrypt_metadata: handler.encrypt_metadata(),
        }
    }

    /// Convert to PDF dictionary
    pub fn to_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        dict.set("Filter", Object::name("Standard"));
        dict.set("V", Object::Integer(self.v as i64));
        dict.set("R", Object::Integer(self.r as i64));
        dict.set("Length", Object::Integer((self.length * 8) as i64));
        dict.set("O", Object::String(self.o.clone()));
        dict.set("U", Object::String(self.u.clone()));
        dict.set("P", Object::Integer(self.p as i64));

        if let Some(ref cf) = self.cf {
            let mut filters = Dictionary::new();
            filters.set(STANDARD_CRYPT_FILTER, cf.to_dict());
            dict.set("CF", filters);
            dict.set("StmF", Object::name(STANDARD_CRYPT_FILTER));
            dict.set("StrF", Object::name(STANDARD_CRYPT_FILTER));
            if !self.encrypt_metadata {
                dict.set("EncryptMetadata", false);
            }
        }

        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc4_128_dictionary() {
        let handler = StandardSecurityHandler::rc4_128bit();
        let dict = EncryptionDictionary::new(&handler, vec![1; 32], vec![2; 32], -1).to_dict();

        assert_eq!(dict.get_name("Filter"), Some("Standard"));
        assert_eq!(dict.get("V"), Some(&Object::Integer(2)));
        assert_eq!(dict.get("R"), Some(&Object::Integer(3)));
        assert_eq!(dict.get("Length"), Some(&Object::Integer(128)));
        assert_eq!(dict.get("P"), Some(&Object::Integer(-1)));
        assert_eq!(dict.get("O"), Some(&Object::String(vec![1; 32])));
        assert!(!dict.contains_key("CF"));
    }

    #[test]
    fn test_rc4_40_dictionary() {
        let handler = StandardSecurityHandler::rc4_40bit();
        let dict = EncryptionDictionary::new(&handler, vec![0; 32], vec![0; 32], -4).to_dict();

        assert_eq!(dict.get("V"), Some(&Object::Integer(1)));
        assert_eq!(dict.get("R"), Some(&Object::Integer(2)));
        assert_eq!(dict.get("Length"), Some(&Object::Integer(40)));
    }

    #[test]
    fn test_aes_dictionary_has_crypt_filter() {
        let handler = StandardSecurityHandler::aes_128bit().with_encrypt_metadata(false);
        let dict = EncryptionDictionary::new(&handler, vec![0; 32], vec![0; 32], -1).to_dict();

        assert_eq!(dict.get("V"), Some(&Object::Integer(4)));
        assert_eq!(dict.get_name("StmF"), Some("StdCF"));
        assert_eq!(dict.get_name("StrF"), Some("StdCF"));
        assert_eq!(dict.get("EncryptMetadata"), Some(&Object::Boolean(false)));

        let std_cf = dict.get_dict("CF").and_then(|cf| cf.get_dict("StdCF")).unwrap();
        assert_eq!(std_cf.get_name("CFM"), Some("AESV2"));
        assert_eq!(std_cf.get("Length"), Some(&Object::Integer(16)));
    }
}
