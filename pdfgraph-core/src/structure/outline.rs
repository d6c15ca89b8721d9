//! Document outline (bookmarks) according to ISO 32000-1 Section 12.3.3

use crate::objects::{Dictionary, Object, ObjectRef, ObjectStore, StoredObject, ToPdfObject};
use bitflags::bitflags;

bitflags! {
    /// Text style of an outline entry (`F` entry, Table 153)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OutlineFlags: u32 {
        const ITALIC = 1;
        const BOLD = 1 << 1;
    }
}

/// An outline entry (bookmark)
#[derive(Debug, Clone)]
pub struct OutlineItem {
    pub title: String,
    /// Page the item jumps to, shown in full (`/Fit`)
    pub page: Option<Object>,
    pub children: Vec<OutlineItem>,
    /// Text color as RGB components in 0.0..=1.0
    pub color: Option<[f64; 3]>,
    /// Text style flags
    pub flags: OutlineFlags,
    /// Closed items hide their children
    pub open: bool,
}

impl OutlineItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            page: None,
            children: Vec::new(),
            color: None,
            flags: OutlineFlags::empty(),
            open: true,
        }
    }

    /// Jump to `page`, which should be a page added to the writer
    pub fn with_page(mut self, page: Object) -> Self {
        self.page = Some(page);
        self
    }

    pub fn add_child(&mut self, child: OutlineItem) {
        self.children.push(child);
    }

    pub fn with_color(mut self, r: f64, g: f64, b: f64) -> Self {
        self.color = Some([r, g, b]);
        self
    }

    pub fn bold(mut self) -> Self {
        self.flags |= OutlineFlags::BOLD;
        self
    }

    pub fn italic(mut self) -> Self {
        self.flags |= OutlineFlags::ITALIC;
        self
    }

    pub fn closed(mut self) -> Self {
        self.open = false;
        self
    }

    /// Number of items in this subtree, including `self`
    pub fn count_all(&self) -> i64 {
        1 + self.children.iter().map(OutlineItem::count_all).sum::<i64>()
    }

    /// Number of items shown when the outline is displayed
    pub fn count_visible(&self) -> i64 {
        if !self.open {
            return 1;
        }
        self.count_visible_if_open()
    }

    /// Items shown if this item were opened, its sub-items keeping their
    /// own state
    pub fn count_visible_if_open(&self) -> i64 {
        1 + self.children.iter().map(OutlineItem::count_visible).sum::<i64>()
    }
}

/// The top level of a document outline
#[derive(Debug, Clone, Default)]
pub struct OutlineTree {
    pub items: Vec<OutlineItem>,
}

impl OutlineTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: OutlineItem) {
        self.items.push(item);
    }

    pub fn total_count(&self) -> i64 {
        self.items.iter().map(OutlineItem::count_all).sum()
    }

    /// `Count` of the outline dictionary
    pub fn visible_count(&self) -> i64 {
        self.items.iter().map(OutlineItem::count_visible).sum()
    }
}

/// Builds an outline depth first: `push_item` opens a level, `pop_item`
/// closes it.
#[derive(Debug, Default)]
pub struct OutlineBuilder {
    tree: OutlineTree,
    open: Vec<OutlineItem>,
}

impl OutlineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: OutlineItem) {
        match self.open.last_mut() {
            Some(parent) => parent.add_child(item),
            None => self.tree.add_item(item),
        }
    }

    pub fn push_item(&mut self, item: OutlineItem) {
        self.open.push(item);
    }

    pub fn pop_item(&mut self) {
        if let Some(item) = self.open.pop() {
            self.add_item(item);
        }
    }

    /// Close every open level and return the tree
    pub fn build(mut self) -> OutlineTree {
        while !self.open.is_empty() {
            self.pop_item();
        }
        self.tree
    }
}

impl ToPdfObject for OutlineTree {
    /// Allocates the outline dictionary and one indirect object per item.
    fn to_pdf_object(&self, store: &mut ObjectStore) -> Object {
        let root = store.reserve();

        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("Outlines"));
        if let Some((first, last)) = write_items(&self.items, root, store) {
            dict.set("First", Object::Indirect(first));
            dict.set("Last", Object::Indirect(last));
            dict.set("Count", self.visible_count());
        }

        store.set_body(root, StoredObject::Indirect(dict.into()));
        Object::Indirect(root)
    }
}

/// Write `items` as siblings under `parent`, returning the first and last.
fn write_items(
    items: &[OutlineItem],
    parent: ObjectRef,
    store: &mut ObjectStore,
) -> Option<(ObjectRef, ObjectRef)> {
    let handles: Vec<ObjectRef> = items.iter().map(|_| store.reserve()).collect();

    for (i, item) in items.iter().enumerate() {
        let mut dict = Dictionary::new();
        dict.set("Title", Object::string(item.title.as_bytes()));
        dict.set("Parent", Object::Indirect(parent));

        if i > 0 {
            dict.set("Prev", Object::Indirect(handles[i - 1]));
        }
        if let Some(next) = handles.get(i + 1) {
            dict.set("Next", Object::Indirect(*next));
        }

        if let Some((first, last)) = write_items(&item.children, handles[i], store) {
            dict.set("First", Object::Indirect(first));
            dict.set("Last", Object::Indirect(last));

            // Negative when closed
            let descendants = item.count_visible_if_open() - 1;
            dict.set("Count", if item.open { descendants } else { -descendants });
        }

        if let Some(page) = &item.page {
            dict.set("Dest", vec![page.clone(), Object::name("Fit")]);
        }

        if let Some([r, g, b]) = item.color {
            dict.set("C", vec![Object::Real(r), Object::Real(g), Object::Real(b)]);
        }

        if !item.flags.is_empty() {
            dict.set("F", i64::from(item.flags.bits()));
        }

        store.set_body(handles[i], StoredObject::Indirect(dict.into()));
    }

    Some((*handles.first()?, *handles.last()?))
}
