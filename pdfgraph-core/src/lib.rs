//! # pdfgraph
//!
//! Build PDF documents as a graph of objects, write them with a classic
//! cross-reference table, optionally encrypted with the Standard Security
//! Handler, and tokenize content streams including inline images.
//!
//! ## Features
//!
//! - **Object graph writer**: identity-based object registration, page
//!   attribute inheritance, deferred `Parent` resolution, xref and trailer
//! - **Encryption**: RC4 40/128-bit and AES-128 (revisions 2 to 4)
//! - **Content streams**: tokenizer, inline image scanning, filter decoding
//!   and basic text extraction
//!
//! ## Quick Start
//!
//! ```rust
//! use pdfgraph::{Page, PdfWriter, Result};
//! use std::io::Cursor;
//!
//! # fn main() -> Result<()> {
//! let mut writer = PdfWriter::new();
//!
//! let mut page = Page::letter();
//! page.set_contents(b"BT /F1 24 Tf 72 700 Td (Hello, PDF!) Tj ET".to_vec());
//! writer.add_page(&page)?;
//!
//! writer.encrypt("user", "owner", None)?;
//!
//! let mut out = Cursor::new(Vec::new());
//! writer.write(&mut out)?;
//! assert!(out.get_ref().starts_with(b"%PDF-1.3"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Reading content streams
//!
//! ```rust
//! use pdfgraph::parser::extract_text;
//!
//! let text = extract_text(b"BT [(Hel)-20(lo)] TJ T* (world) Tj ET").unwrap();
//! assert_eq!(text, "Hello\nworld");
//! ```

pub mod encryption;
pub mod error;
pub mod forms;
pub mod objects;
pub mod page;
pub mod parser;
pub mod structure;
pub mod writer;

pub use encryption::{EncryptOptions, EncryptionAlgorithm, Permissions};
pub use error::{PdfError, Result};
pub use forms::AcroForm;
pub use objects::{Dictionary, Object, ObjectId, ObjectRef, ObjectStore, Stream, ToPdfObject};
pub use page::Page;
pub use structure::{OutlineItem, OutlineTree};
pub use writer::{PdfVersion, PdfWriter, WriterConfig};

/// Current version of pdfgraph
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
