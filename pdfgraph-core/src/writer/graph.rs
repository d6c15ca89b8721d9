//! The set of objects slated for output.
//!
//! Objects are registered by handle identity, in insertion order; the order
//! decides the final object numbers. Registration happens before a body is
//! traversed, so reference cycles terminate once every reachable node is
//! registered.

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectRef, ObjectStore, StoredObject};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ObjectGraph {
    objects: Vec<ObjectRef>,
    index: HashMap<ObjectRef, usize>,
    /// Referent of a `Parent` entry that is not registered yet, mapped to the
    /// objects whose bodies hold that entry
    pending: HashMap<ObjectRef, Vec<ObjectRef>>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, handle: ObjectRef) -> bool {
        self.index.contains_key(&handle)
    }

    /// Zero-based position; the object number is `position + 1`
    pub fn position(&self, handle: ObjectRef) -> Option<usize> {
        self.index.get(&handle).copied()
    }

    pub fn objects(&self) -> &[ObjectRef] {
        &self.objects
    }

    /// Add `handle` unless already present. Returns true if it was added.
    pub fn register(&mut self, handle: ObjectRef) -> bool {
        if self.index.contains_key(&handle) {
            return false;
        }
        self.index.insert(handle, self.objects.len());
        self.objects.push(handle);
        self.pending.remove(&handle);
        true
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return the pending `Parent` referents that never got
    /// registered, each with the objects that point at it.
    pub fn take_unresolved(&mut self) -> Vec<(ObjectRef, Vec<ObjectRef>)> {
        let pending = std::mem::take(&mut self.pending);
        let mut unresolved: Vec<_> = pending
            .into_iter()
            .filter(|(referent, _)| !self.index.contains_key(referent))
            .collect();
        unresolved.sort_by_key(|(referent, _)| referent.index());
        unresolved
    }

    /// Register every object reachable from `obj`. `owner` is the indirect
    /// object whose body contains `obj`, if any.
    pub fn add_objects(
        &mut self,
        store: &ObjectStore,
        obj: &Object,
        owner: Option<ObjectRef>,
    ) -> Result<()> {
        match obj {
            Object::Indirect(handle) | Object::Stream(handle) => {
                if !store.owns(*handle) {
                    return Err(foreign_handle(*handle));
                }
                if self.register(*handle) {
                    tracing::trace!("registered {handle} as object {}", self.len());
                    self.add_body(store, *handle)?;
                }
                Ok(())
            }
            Object::Dictionary(dict) => self.add_dictionary(store, dict, owner),
            Object::Array(items) => {
                for item in items {
                    self.add_objects(store, item, owner)?;
                }
                Ok(())
            }
            Object::Reference(id) => Err(PdfError::UnresolvedReference(*id)),
            _ => Ok(()),
        }
    }

    /// Traverse the body of `handle` whether or not it was registered before.
    pub fn add_body(&mut self, store: &ObjectStore, handle: ObjectRef) -> Result<()> {
        match store.get(handle) {
            Some(StoredObject::Indirect(body)) => self.add_objects(store, body, Some(handle)),
            Some(StoredObject::Stream(stream)) => {
                self.add_dictionary(store, stream.dictionary(), Some(handle))
            }
            None => Err(foreign_handle(handle)),
        }
    }

    fn add_dictionary(
        &mut self,
        store: &ObjectStore,
        dict: &Dictionary,
        owner: Option<ObjectRef>,
    ) -> Result<()> {
        for (key, value) in dict.iter() {
            if key != "Parent" {
                self.add_objects(store, value, owner)?;
                continue;
            }

            match value {
                Object::Null => {}
                Object::Indirect(parent) | Object::Stream(parent) => {
                    if !store.owns(*parent) {
                        return Err(foreign_handle(*parent));
                    }
                    if !self.contains(*parent) {
                        tracing::debug!("parent {parent} is not registered yet");
                        match owner {
                            Some(owner) => {
                                let owners = self.pending.entry(*parent).or_default();
                                if !owners.contains(&owner) {
                                    owners.push(owner);
                                }
                            }
                            None => tracing::warn!(
                                "parent {parent} referenced from a direct dictionary cannot be tracked"
                            ),
                        }
                    }
                }
                Object::Reference(id) => {
                    tracing::debug!("Parent is an unresolved reference {id}");
                    return Err(PdfError::UnresolvedReference(*id));
                }
                other => {
                    tracing::debug!("leaving direct {} Parent in place", other.type_name());
                }
            }
        }
        Ok(())
    }
}

fn foreign_handle(handle: ObjectRef) -> PdfError {
    PdfError::TypeMismatch(format!(
        "object {handle} does not belong to this document's object store"
    ))
}

/// Replace every `Parent` entry equal to `referent` inside `obj` with null.
/// Does not follow handles. Returns the number of entries replaced.
pub(crate) fn null_parent_entries(obj: &mut Object, referent: ObjectRef) -> usize {
    match obj {
        Object::Dictionary(dict) => null_parent_entries_in_dict(dict, referent),
        Object::Array(items) => items
            .iter_mut()
            .map(|item| null_parent_entries(item, referent))
            .sum(),
        _ => 0,
    }
}

pub(crate) fn null_parent_entries_in_dict(dict: &mut Dictionary, referent: ObjectRef) -> usize {
    let mut replaced = 0;
    for (key, value) in dict.iter_mut() {
        if key == "Parent" && value.handle() == Some(referent) {
            *value = Object::Null;
            replaced += 1;
        } else {
            replaced += null_parent_entries(value, referent);
        }
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ObjectId, Stream};

    #[test]
    fn test_register_is_idempotent() {
        let mut store = ObjectStore::new();
        let obj = store.add_indirect(Object::Integer(1));
        let handle = obj.handle().unwrap();

        let mut graph = ObjectGraph::new();
        assert!(graph.register(handle));
        assert!(!graph.register(handle));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.position(handle), Some(0));
    }

    #[test]
    fn test_shared_object_registered_once() {
        let mut store = ObjectStore::new();
        let font = store.add_indirect(Dictionary::from_iter([(
            "Type".to_string(),
            Object::name("Font"),
        )]));
        let array = Object::Array(vec![font.clone(), font.clone(), font]);

        let mut graph = ObjectGraph::new();
        graph.add_objects(&store, &array, None).unwrap();
        graph.add_objects(&store, &array, None).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut store = ObjectStore::new();
        let a = store.add_indirect(Dictionary::new());
        let b = store.add_indirect(Dictionary::new());
        let (ha, hb) = (a.handle().unwrap(), b.handle().unwrap());
        store.dict_mut(ha).unwrap().set("Next", b.clone());
        store.dict_mut(hb).unwrap().set("Prev", a.clone());

        let mut graph = ObjectGraph::new();
        graph.add_objects(&store, &a, None).unwrap();
        assert_eq!(graph.objects(), &[ha, hb]);
    }

    #[test]
    fn test_stream_dictionary_traversed() {
        let mut store = ObjectStore::new();
        let font = store.add_indirect(Dictionary::new());
        let mut dict = Dictionary::new();
        dict.set("Font", font.clone());
        let stream = store.add_stream(Stream::with_dictionary(dict, b"data".to_vec()));

        let mut graph = ObjectGraph::new();
        graph.add_objects(&store, &stream, None).unwrap();
        assert_eq!(graph.len(), 2);
        assert!(graph.contains(font.handle().unwrap()));
    }

    #[test]
    fn test_parent_is_deferred() {
        let mut store = ObjectStore::new();
        let parent = store.add_indirect(Dictionary::new());
        let mut child = Dictionary::new();
        child.set("Parent", parent.clone());
        let child = store.add_indirect(child);

        let mut graph = ObjectGraph::new();
        graph.add_objects(&store, &child, None).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.pending_count(), 1);

        // registering the parent resolves the pending entry
        graph.add_objects(&store, &parent, None).unwrap();
        assert_eq!(graph.pending_count(), 0);
        assert!(graph.take_unresolved().is_empty());
    }

    #[test]
    fn test_unresolved_parent_reported_with_owner() {
        let mut store = ObjectStore::new();
        let parent = store.add_indirect(Dictionary::new());
        let mut child = Dictionary::new();
        child.set("Parent", parent.clone());
        let child = store.add_indirect(child);

        let mut graph = ObjectGraph::new();
        graph.add_objects(&store, &child, None).unwrap();

        let unresolved = graph.take_unresolved();
        assert_eq!(
            unresolved,
            vec![(parent.handle().unwrap(), vec![child.handle().unwrap()])]
        );
    }

    #[test]
    fn test_bare_reference_rejected() {
        let store = ObjectStore::new();
        let mut graph = ObjectGraph::new();

        let mut dict = Dictionary::new();
        dict.set("Parent", Object::Reference(ObjectId::new(4, 0)));
        let result = graph.add_objects(&store, &Object::Dictionary(dict), None);
        assert!(matches!(result, Err(PdfError::UnresolvedReference(id)) if id.number() == 4));

        let array = Object::Array(vec![Object::Reference(ObjectId::new(5, 0))]);
        assert!(graph.add_objects(&store, &array, None).is_err());
    }

    #[test]
    fn test_foreign_handle_rejected_before_registration() {
        let mut other = ObjectStore::new();
        let foreign = other.add_indirect(Dictionary::new());
        let mut store = ObjectStore::new();
        store.add_indirect(Object::Integer(1));

        let mut graph = ObjectGraph::new();
        let wrapped = Object::Array(vec![foreign.clone()]);
        assert!(matches!(
            graph.add_objects(&store, &wrapped, None),
            Err(PdfError::TypeMismatch(_))
        ));
        assert!(graph.is_empty());
        assert!(graph.add_body(&store, foreign.handle().unwrap()).is_err());
    }

    #[test]
    fn test_null_parent_entries() {
        let mut store = ObjectStore::new();
        let parent = store.add_indirect(Dictionary::new());
        let handle = parent.handle().unwrap();

        let mut inner = Dictionary::new();
        inner.set("Parent", parent.clone());
        let mut outer = Dictionary::new();
        outer.set("Parent", parent);
        outer.set("Kids", Object::Array(vec![Object::Dictionary(inner)]));
        let mut obj = Object::Dictionary(outer);

        assert_eq!(null_parent_entries(&mut obj, handle), 2);
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Parent"), Some(&Object::Null));
    }
}
