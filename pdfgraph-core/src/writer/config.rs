use chrono::{DateTime, Utc};
use std::fmt;

/// PDF version written to the header and the catalog `Version` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        Self { major: 1, minor: 3 }
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Configuration for the PDF writer
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub version: PdfVersion,
    /// `Producer` entry of the document information dictionary
    pub producer: String,
    /// `Creator` entry of the document information dictionary
    pub creator: String,
    /// Written as `CreationDate` when set
    pub creation_date: Option<DateTime<Utc>>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            version: PdfVersion::default(),
            producer: format!("pdfgraph library version {}", env!("CARGO_PKG_VERSION")),
            creator: "pdfgraph".to_string(),
            creation_date: None,
        }
    }
}

impl WriterConfig {
    pub fn with_version(mut self, major: u8, minor: u8) -> Self {
        self.version = PdfVersion::new(major, minor);
        self
    }

    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    pub fn with_creation_date(mut self, date: DateTime<Utc>) -> Self {
        self.creation_date = Some(date);
        self
    }
}

/// Format a DateTime as a PDF date string (D:YYYYMMDDHHmmSSOHH'mm)
pub(crate) fn format_pdf_date(date: DateTime<Utc>) -> String {
    let formatted = date.format("D:%Y%m%d%H%M%S");

    // For UTC, the offset is always +00'00
    format!("{formatted}+00'00")
}
