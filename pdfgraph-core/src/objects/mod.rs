mod dictionary;
mod primitive;
mod serialize;
mod store;
mod stream;

pub use dictionary::Dictionary;
pub use primitive::{Object, ObjectId};
pub use serialize::{ObjectNumbering, Unnumbered};
pub use store::{ObjectRef, ObjectStore, StoredObject};
pub use stream::Stream;

/// Conversion of a higher-level structure (page, outline, form) into PDF
/// objects allocated in `store`.
pub trait ToPdfObject {
    fn to_pdf_object(&self, store: &mut ObjectStore) -> Object;
}

impl ToPdfObject for Object {
    fn to_pdf_object(&self, _store: &mut ObjectStore) -> Object {
        self.clone()
    }
}
