//! Object graph writer.
//!
//! [`PdfWriter`] owns the document's objects, tracks which of them are
//! reachable from the catalog and writes them with a classic cross-reference
//! table and trailer.

mod config;
mod graph;
mod pdf_writer;

pub use config::{PdfVersion, WriterConfig};
pub use graph::ObjectGraph;
pub use pdf_writer::PdfWriter;
