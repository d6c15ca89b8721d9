//! Interactive forms according to ISO 32000-1 Chapter 12.7

mod acroform;

pub use acroform::AcroForm;
