use crate::encryption::{EncryptOptions, SecurityState};
use crate::error::{PdfError, Result};
use crate::forms::AcroForm;
use crate::objects::{
    Dictionary, Object, ObjectId, ObjectRef, ObjectStore, StoredObject, ToPdfObject,
};
use crate::structure::OutlineTree;
use crate::writer::config::{format_pdf_date, PdfVersion, WriterConfig};
use crate::writer::graph::{null_parent_entries, null_parent_entries_in_dict, ObjectGraph};
use std::collections::{HashMap, HashSet};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

/// Page attributes a page may omit and take from its nearest ancestor
const INHERITABLE_ATTRIBUTES: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Keys followed when looking for the pages a form field sits on
const FIELD_TREE_KEYS: [&str; 2] = ["Fields", "Kids"];

/// Builds a PDF document as a graph of objects and writes it out in one pass.
///
/// The information dictionary, the catalog and the root page tree node are
/// created up front and become objects 1, 2 and 3. Everything else is
/// numbered in the order it is first reached.
pub struct PdfWriter {
    config: WriterConfig,
    store: ObjectStore,
    graph: ObjectGraph,
    info: ObjectRef,
    catalog: ObjectRef,
    pages: ObjectRef,
    outlines: Option<OutlineTree>,
    acro_form: Option<AcroForm>,
    legacy_fields: Vec<Object>,
    security: Option<(SecurityState, ObjectRef)>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default())
    }

    pub fn with_config(config: WriterConfig) -> Self {
        let mut store = ObjectStore::new();

        let info = store.reserve();
        let catalog = store.reserve();
        let pages = store.reserve();

        let mut info_dict = Dictionary::new();
        info_dict.set("Producer", Object::string(config.producer.as_bytes()));
        info_dict.set("Creator", Object::string(config.creator.as_bytes()));
        if let Some(date) = config.creation_date {
            info_dict.set("CreationDate", Object::string(format_pdf_date(date)));
        }

        let mut catalog_dict = Dictionary::new();
        catalog_dict.set("Type", Object::name("Catalog"));
        catalog_dict.set("Pages", Object::Indirect(pages));

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::name("Pages"));
        pages_dict.set("Kids", Object::Array(Vec::new()));
        pages_dict.set("Count", 0i64);

        store.set_body(info, StoredObject::Indirect(info_dict.into()));
        store.set_body(catalog, StoredObject::Indirect(catalog_dict.into()));
        store.set_body(pages, StoredObject::Indirect(pages_dict.into()));

        let mut graph = ObjectGraph::new();
        graph.register(info);
        graph.register(catalog);
        graph.register(pages);

        Self {
            config,
            store,
            graph,
            info,
            catalog,
            pages,
            outlines: None,
            acro_form: None,
            legacy_fields: Vec::new(),
            security: None,
        }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.config.version = PdfVersion::new(major, minor);
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Objects built here can be handed to [`PdfWriter::add_page`] and the
    /// other `add_*` calls.
    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    pub fn info(&self) -> ObjectRef {
        self.info
    }

    pub fn catalog(&self) -> ObjectRef {
        self.catalog
    }

    pub fn pages_root(&self) -> ObjectRef {
        self.pages
    }

    /// Number of objects registered for output so far
    pub fn object_count(&self) -> usize {
        self.graph.len()
    }

    pub fn contains(&self, obj: &Object) -> bool {
        obj.handle().is_some_and(|h| self.graph.contains(h))
    }

    /// The number `handle` is written under, if it is registered
    pub fn object_id(&self, handle: ObjectRef) -> Option<ObjectId> {
        self.graph
            .position(handle)
            .map(|i| ObjectId::new(i as u32 + 1, 0))
    }

    pub fn security(&self) -> Option<&SecurityState> {
        self.security.as_ref().map(|(state, _)| state)
    }

    /// Add a page to the root of the page tree.
    ///
    /// Missing inheritable attributes are copied from the page's ancestors,
    /// nearest first, and the page is re-parented under the root node.
    pub fn add_page(&mut self, page: &dyn ToPdfObject) -> Result<ObjectRef> {
        let page_obj = page.to_pdf_object(&mut self.store);
        let handle = match &page_obj {
            Object::Indirect(h) if !self.store.owns(*h) => {
                return Err(PdfError::TypeMismatch(format!(
                    "page {h} belongs to another object store"
                )))
            }
            Object::Indirect(h) => *h,
            other => {
                return Err(PdfError::TypeMismatch(format!(
                    "page must be an indirect object, found {}",
                    other.type_name()
                )))
            }
        };

        let page_dict = match self.store.resolve(&page_obj) {
            Object::Dictionary(dict) if dict.get_name("Type") == Some("Page") => dict,
            Object::Dictionary(_) => {
                return Err(PdfError::TypeMismatch(
                    "page dictionary must have /Type /Page".to_string(),
                ))
            }
            other => {
                return Err(PdfError::TypeMismatch(format!(
                    "page body must be a dictionary, found {}",
                    other.type_name()
                )))
            }
        };

        if self.root_kids().iter().any(|kid| kid.handle() == Some(handle)) {
            tracing::warn!("page {handle} is already in the page tree");
            return Ok(handle);
        }

        let inherited = self.collect_inherited(handle, page_dict)?;

        if let Some(dict) = self.store.dict_mut(handle) {
            for (key, value) in inherited {
                tracing::trace!("page {handle} inherits /{key}");
                dict.set(key, value);
            }
            dict.set("Parent", Object::Indirect(self.pages));
        }

        if let Some(root) = self.store.dict_mut(self.pages) {
            match root.get_mut("Kids") {
                Some(Object::Array(kids)) => kids.push(Object::Indirect(handle)),
                _ => root.set("Kids", vec![Object::Indirect(handle)]),
            }
            let count = root.get("Count").and_then(Object::as_integer).unwrap_or(0);
            root.set("Count", count + 1);
        }

        self.graph.register(handle);
        self.graph.add_body(&self.store, handle)?;

        tracing::debug!(
            "added page {handle}, document now has {} objects",
            self.graph.len()
        );
        Ok(handle)
    }

    fn root_kids(&self) -> &[Object] {
        self.store
            .dict(self.pages)
            .and_then(|root| root.get("Kids"))
            .and_then(Object::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn collect_inherited(
        &self,
        page: ObjectRef,
        page_dict: &Dictionary,
    ) -> Result<Vec<(&'static str, Object)>> {
        let mut inherited: Vec<(&'static str, Object)> = Vec::new();
        let mut visited = HashSet::from([page]);
        let mut parent = page_dict.get("Parent");

        loop {
            let ancestor = match parent {
                None | Some(Object::Null) => break,
                Some(Object::Indirect(h)) => *h,
                Some(other) => {
                    return Err(PdfError::InvalidParent(format!(
                        "Parent must be an indirect object, found {}",
                        other.type_name()
                    )))
                }
            };

            if !visited.insert(ancestor) {
                return Err(PdfError::InvalidParent(format!(
                    "page tree loops back to {ancestor}"
                )));
            }

            let dict = self.store.dict(ancestor).ok_or_else(|| {
                PdfError::InvalidParent(format!("ancestor {ancestor} is not a dictionary"))
            })?;

            for key in INHERITABLE_ATTRIBUTES {
                let present = page_dict.contains_key(key)
                    || inherited.iter().any(|(k, _)| *k == key);
                if present {
                    continue;
                }
                if let Some(value) = dict.get(key) {
                    inherited.push((key, value.clone()));
                }
            }

            parent = dict.get("Parent");
        }

        Ok(inherited)
    }

    /// Attach a document outline, rendered when the document is written.
    pub fn add_outline_tree(&mut self, outline: OutlineTree) {
        self.outlines = Some(outline);
    }

    /// Attach an interactive form, rendered when the document is written.
    pub fn add_acro_form(&mut self, form: AcroForm) {
        self.acro_form = Some(form);
    }

    /// Import the fields of an existing `AcroForm` dictionary.
    ///
    /// Only fields placed on pages already added to this writer are kept. A
    /// field whose `P` entry points at any other indirect object is an error;
    /// a field with no `P` entry at all is skipped.
    pub fn add_forms(&mut self, forms: &Object) -> Result<()> {
        let forms_dict = self.store.resolve(forms).as_dict().ok_or_else(|| {
            PdfError::TypeMismatch(format!(
                "AcroForm must be a dictionary, found {}",
                forms.type_name()
            ))
        })?;

        let fields = match forms_dict.get("Fields").map(|f| self.store.resolve(f)) {
            Some(Object::Array(fields)) => fields.clone(),
            Some(other) => {
                return Err(PdfError::TypeMismatch(format!(
                    "AcroForm /Fields must be an array, found {}",
                    other.type_name()
                )))
            }
            None => {
                tracing::debug!("AcroForm has no /Fields");
                return Ok(());
            }
        };

        for field in fields {
            let pages = seek_by_name(&self.store, &field, "P", &FIELD_TREE_KEYS);
            if pages.is_empty() {
                tracing::debug!("dropping form field without a /P entry");
                continue;
            }

            let mut placed = false;
            for page in &pages {
                match page.handle() {
                    Some(h) if self.graph.contains(h) => placed = true,
                    Some(h) => {
                        return Err(PdfError::OutOfScopeReference(format!(
                            "form field refers to page {h}, which is not part of this document"
                        )))
                    }
                    None => tracing::debug!("ignoring direct /P value of a form field"),
                }
            }

            if placed {
                self.graph.add_objects(&self.store, &field, None)?;
                self.legacy_fields.push(field);
            }
        }

        Ok(())
    }

    /// Set the catalog's `OCProperties` and register everything it reaches.
    pub fn set_oc_properties(&mut self, properties: Object) -> Result<()> {
        if let Some(catalog) = self.store.dict_mut(self.catalog) {
            catalog.set("OCProperties", properties.clone());
        }
        self.graph
            .add_objects(&self.store, &properties, Some(self.catalog))
    }

    /// Encrypt the document with the standard security handler when written.
    ///
    /// `options` defaults to 128-bit RC4 with every permission granted.
    pub fn encrypt(
        &mut self,
        user_password: &str,
        owner_password: &str,
        options: Option<EncryptOptions>,
    ) -> Result<()> {
        let options = options.unwrap_or_default();
        let state = SecurityState::new(
            user_password.as_bytes(),
            owner_password.as_bytes(),
            &options,
        )?;
        let dict = state.encryption_dictionary().to_dict();

        let handle = match self.security.take() {
            Some((_, handle)) => {
                tracing::warn!("document was already encrypted, replacing the security settings");
                self.store.set_body(handle, StoredObject::Indirect(dict.into()));
                handle
            }
            None => {
                let handle = self.store.reserve();
                self.store.set_body(handle, StoredObject::Indirect(dict.into()));
                handle
            }
        };
        self.graph.register(handle);

        tracing::debug!(algorithm = ?options.algorithm, "document encryption enabled");
        self.security = Some((state, handle));
        Ok(())
    }

    /// Write the whole document to `sink` in a single pass.
    ///
    /// Xref offsets are absolute positions in `sink`. On error the sink holds
    /// an incomplete document.
    pub fn write<W: Write + Seek>(&mut self, sink: &mut W) -> Result<()> {
        self.render_deferred();

        if let Some(catalog) = self.store.dict_mut(self.catalog) {
            catalog.set("Version", Object::name(self.config.version.to_string()));
        }

        // Re-scan every registered body so that later edits through
        // store_mut are picked up.
        let mut i = 0;
        while i < self.graph.len() {
            let handle = self.graph.objects()[i];
            self.graph.add_body(&self.store, handle)?;
            i += 1;
        }

        self.null_unresolved_parents();

        let numbering: HashMap<ObjectRef, ObjectId> = self
            .graph
            .objects()
            .iter()
            .enumerate()
            .map(|(i, h)| (*h, ObjectId::new(i as u32 + 1, 0)))
            .collect();

        let start = sink.stream_position()?;
        let mut out = ByteSink {
            writer: sink,
            current_position: start,
        };

        out.write_header(&self.config.version.to_string())?;

        let mut xref_positions = Vec::with_capacity(self.graph.len());
        for handle in self.graph.objects() {
            let id = numbering[handle];
            xref_positions.push(out.current_position);
            let bytes = self.serialize_object(*handle, id, &numbering)?;
            out.write_bytes(&bytes)?;
        }

        let xref_position = out.current_position;
        out.write_xref(&xref_positions)?;

        let mut trailer = Dictionary::new();
        trailer.set("Info", Object::Indirect(self.info));
        trailer.set("Root", Object::Indirect(self.catalog));
        trailer.set("Size", (xref_positions.len() + 1) as i64);
        if let Some((state, handle)) = &self.security {
            trailer.set("Encrypt", Object::Indirect(*handle));
            trailer.set("ID", state.id_array());
        }
        out.write_trailer(&trailer, &numbering, xref_position)?;
        out.writer.flush()?;

        tracing::debug!(
            "wrote {} objects, xref at offset {xref_position}",
            xref_positions.len()
        );
        Ok(())
    }

    /// Write the document to a new file at `path`.
    pub fn write_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn render_deferred(&mut self) {
        if let Some(outline) = self.outlines.take() {
            let outlines = outline.to_pdf_object(&mut self.store);
            if let Some(catalog) = self.store.dict_mut(self.catalog) {
                catalog.set("Outlines", outlines);
            }
        }

        let acro_form = match self.acro_form.take() {
            Some(form) => Some(form.to_pdf_object(&mut self.store)),
            None if !self.legacy_fields.is_empty() => {
                let mut dict = Dictionary::new();
                dict.set("Fields", Object::Array(std::mem::take(&mut self.legacy_fields)));
                Some(Object::Dictionary(dict))
            }
            None => None,
        };
        if let (Some(form), Some(catalog)) = (acro_form, self.store.dict_mut(self.catalog)) {
            catalog.set("AcroForm", form);
        }
    }

    fn null_unresolved_parents(&mut self) {
        for (referent, owners) in self.graph.take_unresolved() {
            for owner in owners {
                let replaced = match self.store.get_mut(owner) {
                    Some(StoredObject::Indirect(body)) => null_parent_entries(body, referent),
                    Some(StoredObject::Stream(stream)) => {
                        null_parent_entries_in_dict(stream.dictionary_mut(), referent)
                    }
                    None => 0,
                };
                tracing::warn!(
                    "parent {referent} of object {owner} is not part of the document, \
                     replaced {replaced} entries with null"
                );
            }
        }
    }

    fn serialize_object(
        &self,
        handle: ObjectRef,
        id: ObjectId,
        numbering: &HashMap<ObjectRef, ObjectId>,
    ) -> Result<Vec<u8>> {
        let security = match &self.security {
            Some((state, encrypt_dict)) if *encrypt_dict != handle => Some(state),
            _ => None,
        };

        let mut out = format!("{} {} obj\n", id.number(), id.generation()).into_bytes();
        match self.store.get(handle) {
            Some(StoredObject::Indirect(body)) => {
                match security {
                    Some(state) => state.encrypt_object(body, id)?.write_to(&mut out, numbering),
                    None => body.write_to(&mut out, numbering),
                }
                out.extend_from_slice(b"\nendobj\n");
            }
            Some(StoredObject::Stream(stream)) => {
                let encrypted;
                let stream = match security {
                    Some(state) => {
                        encrypted = state.encrypt_stream(stream, id)?;
                        &encrypted
                    }
                    None => stream,
                };

                let mut dict = stream.dictionary().clone();
                dict.set("Length", stream.data().len() as i64);
                dict.write_to(&mut out, numbering);
                out.extend_from_slice(b"\nstream\n");
                out.extend_from_slice(stream.data());
                out.extend_from_slice(b"\nendstream\nendobj\n");
            }
            None => {
                return Err(PdfError::TypeMismatch(format!(
                    "object {handle} does not belong to this document"
                )))
            }
        }
        Ok(out)
    }
}

/// Collect every value stored under `key` in `obj` and in the dictionaries
/// reachable through the `follow` keys.
fn seek_by_name(store: &ObjectStore, obj: &Object, key: &str, follow: &[&str]) -> Vec<Object> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    seek_into(store, obj, key, follow, &mut visited, &mut found);
    found
}

fn seek_into(
    store: &ObjectStore,
    obj: &Object,
    key: &str,
    follow: &[&str],
    visited: &mut HashSet<ObjectRef>,
    found: &mut Vec<Object>,
) {
    if let Some(h) = obj.handle() {
        if !visited.insert(h) {
            return;
        }
    }

    match store.resolve(obj) {
        Object::Dictionary(dict) => {
            if let Some(value) = dict.get(key) {
                found.push(value.clone());
            }
            for name in follow {
                if let Some(next) = dict.get(name) {
                    seek_into(store, next, key, follow, visited, found);
                }
            }
        }
        Object::Array(items) => {
            for item in items {
                seek_into(store, item, key, follow, visited, found);
            }
        }
        _ => {}
    }
}

struct ByteSink<'a, W: Write> {
    writer: &'a mut W,
    current_position: u64,
}

impl<W: Write> ByteSink<'_, W> {
    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }

    fn write_header(&mut self, version: &str) -> Result<()> {
        self.write_bytes(format!("%PDF-{version}\n").as_bytes())?;
        // Binary comment to ensure file is treated as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])
    }

    fn write_xref(&mut self, positions: &[u64]) -> Result<()> {
        self.write_bytes(b"xref\n")?;
        self.write_bytes(format!("0 {}\n", positions.len() + 1).as_bytes())?;
        self.write_bytes(b"0000000000 65535 f\r\n")?;
        for position in positions {
            self.write_bytes(format!("{position:010} {:05} n\r\n", 0).as_bytes())?;
        }
        Ok(())
    }

    fn write_trailer(
        &mut self,
        trailer: &Dictionary,
        numbering: &HashMap<ObjectRef, ObjectId>,
        xref_position: u64,
    ) -> Result<()> {
        let mut bytes = b"trailer\n".to_vec();
        trailer.write_to(&mut bytes, numbering);
        bytes.extend_from_slice(format!("\nstartxref\n{xref_position}\n%%EOF\n").as_bytes());
        self.write_bytes(&bytes)
    }
}
