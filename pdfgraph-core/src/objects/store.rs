//! Identity arena for indirect objects and streams.
//!
//! Every indirect object or stream lives in an [`ObjectStore`] and is
//! referred to through a copyable [`ObjectRef`] handle. Two handles are the
//! same object exactly when they compare equal; values are never compared to
//! decide identity. A handle carries the id of the store that issued it, so
//! a store never resolves a handle issued by another one. Reference cycles (a page pointing at its `Parent`, which
//! lists the page in `Kids`) are expressed as handles and need no shared
//! ownership.

use crate::objects::{Dictionary, Object, Stream};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Store ids start at 1; 0 is never issued.
static NEXT_STORE_ID: AtomicU32 = AtomicU32::new(1);

/// Stable handle to an object held by an [`ObjectStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    store: u32,
    index: usize,
}

impl ObjectRef {
    /// A handle that no store owns
    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self { store: 0, index }
    }

    /// Position in the issuing store
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Body stored behind a handle.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredObject {
    Indirect(Object),
    Stream(Stream),
}

impl StoredObject {
    /// The dictionary of the body: the object itself for indirect
    /// dictionaries, the stream dictionary for streams.
    pub fn dict(&self) -> Option<&Dictionary> {
        match self {
            StoredObject::Indirect(obj) => obj.as_dict(),
            StoredObject::Stream(stream) => Some(stream.dictionary()),
        }
    }

    pub fn dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            StoredObject::Indirect(obj) => obj.as_dict_mut(),
            StoredObject::Stream(stream) => Some(stream.dictionary_mut()),
        }
    }
}

/// Cloning a store keeps its id: handles of the original resolve in the
/// copy to the copied bodies.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    id: u32,
    objects: Vec<StoredObject>,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    pub fn new() -> Self {
        Self {
            id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
            objects: Vec::new(),
        }
    }

    /// Whether `handle` was issued by this store
    pub fn owns(&self, handle: ObjectRef) -> bool {
        handle.store == self.id && handle.index < self.objects.len()
    }

    /// Allocate an indirect object and return the `Object::Indirect` pointing at it.
    pub fn add_indirect(&mut self, body: impl Into<Object>) -> Object {
        Object::Indirect(self.push(StoredObject::Indirect(body.into())))
    }

    /// Allocate a stream and return the `Object::Stream` pointing at it.
    pub fn add_stream(&mut self, stream: Stream) -> Object {
        Object::Stream(self.push(StoredObject::Stream(stream)))
    }

    /// Allocate an indirect object with a null body, to be filled in with
    /// [`ObjectStore::set_body`] once its own handle is known to others.
    pub fn reserve(&mut self) -> ObjectRef {
        self.push(StoredObject::Indirect(Object::Null))
    }

    /// Replace the body behind `handle`, returning the previous one.
    pub fn set_body(&mut self, handle: ObjectRef, body: StoredObject) -> Option<StoredObject> {
        self.get_mut(handle).map(|slot| std::mem::replace(slot, body))
    }

    fn push(&mut self, stored: StoredObject) -> ObjectRef {
        let handle = ObjectRef {
            store: self.id,
            index: self.objects.len(),
        };
        self.objects.push(stored);
        handle
    }

    /// The body behind `handle`; `None` for handles of other stores.
    pub fn get(&self, handle: ObjectRef) -> Option<&StoredObject> {
        if handle.store != self.id {
            return None;
        }
        self.objects.get(handle.index)
    }

    pub fn get_mut(&mut self, handle: ObjectRef) -> Option<&mut StoredObject> {
        if handle.store != self.id {
            return None;
        }
        self.objects.get_mut(handle.index)
    }

    pub fn dict(&self, handle: ObjectRef) -> Option<&Dictionary> {
        self.get(handle).and_then(StoredObject::dict)
    }

    pub fn dict_mut(&mut self, handle: ObjectRef) -> Option<&mut Dictionary> {
        self.get_mut(handle).and_then(StoredObject::dict_mut)
    }

    /// Follow an `Indirect` handle to its body; other objects, and handles
    /// of other stores, are returned as is.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Indirect(h) => match self.get(*h) {
                Some(StoredObject::Indirect(body)) => body,
                _ => obj,
            },
            _ => obj,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
