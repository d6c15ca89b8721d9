use crate::objects::ObjectId;
use crate::parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Invalid parent: {0}")]
    InvalidParent(String),

    #[error("Unresolved reference {0}: references must be resolved before writing")]
    UnresolvedReference(ObjectId),

    #[error("Reference outside of the written pages: {0}")]
    OutOfScopeReference(String),

    #[error("Content stream error: {0}")]
    Parse(#[from] ParseError),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Random source failure: {0}")]
    Random(#[from] rand::Error),

    #[error("Compression error: {0}")]
    CompressionError(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;
