//! Content stream parsing
//!
//! Tokenizes page content streams into operations, reads inline images and
//! decodes their payloads. Parsing of whole PDF files is out of scope.

pub mod content;
pub mod filters;
pub mod inline_image;
pub mod resources;

pub use self::content::{
    extract_text, extract_text_from_operations, operations_to_bytes, ContentOperation,
    ContentParser, ContentTokenizer, Token,
};
pub use self::inline_image::{Image, InlineImage};
pub use self::resources::{Colorspace, PageResources};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Content stream errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unknown inline image parameter: {0}")]
    UnknownInlineImageParameter(String),

    #[error("Inline image starting at position {position} has no EI terminator")]
    UnterminatedInlineImage { position: usize },

    #[error("Height attribute missing")]
    MissingHeight,

    #[error("Width attribute missing")]
    MissingWidth,

    #[error("Invalid inline image parameter {key}: expected {expected}, found {found}")]
    InvalidImageParameter {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid operand for {operator}: expected {expected}, found {found}")]
    InvalidOperand {
        operator: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unsupported colorspace: {0}")]
    UnsupportedColorspace(String),

    #[error("Unknown colorspace: {0}")]
    UnknownColorspace(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Stream decode error: {0}")]
    StreamDecodeError(String),
}
