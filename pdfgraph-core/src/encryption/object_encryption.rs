//! Per-document security state and encryption of object bodies.

use crate::encryption::{
    EncryptOptions, EncryptionDictionary, StandardSecurityHandler,
};
use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;

/// Everything derived once from the passwords: `O`, `U`, `P`, the file ID
/// pair and the file key. Immutable after creation.
#[derive(Debug, Clone)]
pub struct SecurityState {
    handler: StandardSecurityHandler,
    owner_hash: Vec<u8>,
    user_hash: Vec<u8>,
    permissions: i32,
    file_key: Vec<u8>,
    file_ids: [Vec<u8>; 2],
}

/// ID pair for a new file: MD5 of the current time and MD5 of 100 random bytes.
pub fn generate_file_ids() -> Result<[Vec<u8>; 2]> {
    let id0 = md5::compute(Utc::now().to_rfc2822().as_bytes()).0.to_vec();

    let mut noise = [0u8; 100];
    OsRng.try_fill_bytes(&mut noise)?;
    let id1 = md5::compute(noise).0.to_vec();

    Ok([id0, id1])
}

impl SecurityState {
    /// Derive the security state with freshly generated file IDs.
    pub fn new(user_password: &[u8], owner_password: &[u8], options: &EncryptOptions) -> Result<Self> {
        Ok(Self::with_file_ids(
            user_password,
            owner_password,
            options,
            generate_file_ids()?,
        ))
    }

    /// Derive the security state for a known ID pair.
    pub fn with_file_ids(
        user_password: &[u8],
        owner_password: &[u8],
        options: &EncryptOptions,
        file_ids: [Vec<u8>; 2],
    ) -> Self {
        let handler = StandardSecurityHandler::for_algorithm(options.algorithm)
            .with_encrypt_metadata(options.encrypt_metadata);
        let permissions = options.p_value();

        let owner_hash = handler.compute_owner_hash(owner_password, user_password);
        let (user_hash, file_key) =
            handler.compute_user_hash(user_password, &owner_hash, permissions, &file_ids[0]);

        tracing::debug!(
            revision = handler.revision() as u8,
            key_bits = handler.key_length() * 8,
            "derived document encryption key"
        );

        Self {
            handler,
            owner_hash,
            user_hash,
            permissions,
            file_key,
            file_ids,
        }
    }

    pub fn handler(&self) -> &StandardSecurityHandler {
        &self.handler
    }

    pub fn owner_hash(&self) -> &[u8] {
        &self.owner_hash
    }

    pub fn user_hash(&self) -> &[u8] {
        &self.user_hash
    }

    pub fn permissions(&self) -> i32 {
        self.permissions
    }

    pub fn file_key(&self) -> &[u8] {
        &self.file_key
    }

    pub fn file_ids(&self) -> &[Vec<u8>; 2] {
        &self.file_ids
    }

    /// The trailer `ID` array.
    pub fn id_array(&self) -> Object {
        Object::Array(vec![
            Object::String(self.file_ids[0].clone()),
            Object::String(self.file_ids[1].clone()),
        ])
    }

    pub fn encryption_dictionary(&self) -> EncryptionDictionary {
        EncryptionDictionary::new(
            &self.handler,
            self.owner_hash.clone(),
            self.user_hash.clone(),
            self.permissions,
        )
    }

    /// Copy of `object` with every string leaf encrypted under the key of `obj_id`.
    pub fn encrypt_object(&self, object: &Object, obj_id: ObjectId) -> Result<Object> {
        self.transform_object(object, obj_id, Direction::Encrypt)
    }

    pub fn decrypt_object(&self, object: &Object, obj_id: ObjectId) -> Result<Object> {
        self.transform_object(object, obj_id, Direction::Decrypt)
    }

    /// Copy of `stream` with its strings and data encrypted. Metadata streams
    /// stay in the clear when metadata encryption is off.
    pub fn encrypt_stream(&self, stream: &Stream, obj_id: ObjectId) -> Result<Stream> {
        self.transform_stream(stream, obj_id, Direction::Encrypt)
    }

    pub fn decrypt_stream(&self, stream: &Stream, obj_id: ObjectId) -> Result<Stream> {
        self.transform_stream(stream, obj_id, Direction::Decrypt)
    }

    fn transform_stream(&self, stream: &Stream, obj_id: ObjectId, direction: Direction) -> Result<Stream> {
        let dictionary = self.transform_dictionary(stream.dictionary(), obj_id, direction)?;
        let data = if self.should_encrypt_stream(stream) {
            self.transform_bytes(stream.data(), obj_id, direction)?
        } else {
            stream.data().to_vec()
        };
        Ok(Stream::with_dictionary(dictionary, data))
    }

    fn transform_object(&self, object: &Object, obj_id: ObjectId, direction: Direction) -> Result<Object> {
        Ok(match object {
            Object::String(bytes) => Object::String(self.transform_bytes(bytes, obj_id, direction)?),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.transform_object(item, obj_id, direction))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Object::Dictionary(dict) => {
                Object::Dictionary(self.transform_dictionary(dict, obj_id, direction)?)
            }
            // handles are encrypted under their own number when written
            other => other.clone(),
        })
    }

    fn transform_dictionary(
        &self,
        dict: &Dictionary,
        obj_id: ObjectId,
        direction: Direction,
    ) -> Result<Dictionary> {
        dict.iter()
            .map(|(key, value)| {
                Ok((key.clone(), self.transform_object(value, obj_id, direction)?))
            })
            .collect()
    }

    fn transform_bytes(&self, data: &[u8], obj_id: ObjectId, direction: Direction) -> Result<Vec<u8>> {
        match direction {
            Direction::Encrypt => self.handler.encrypt_bytes(&self.file_key, obj_id, data),
            Direction::Decrypt => self.handler.decrypt_bytes(&self.file_key, obj_id, data),
        }
    }

    fn should_encrypt_stream(&self, stream: &Stream) -> bool {
        self.handler.encrypt_metadata() || stream.dictionary().get_name("Type") != Some("Metadata")
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}
