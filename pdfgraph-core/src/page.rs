use crate::objects::{Dictionary, Object, ObjectStore, Stream, ToPdfObject};

/// A page to be added to a [`PdfWriter`](crate::writer::PdfWriter).
///
/// Attributes left unset are omitted from the page dictionary, so that the
/// page inherits them from an ancestor given with [`Page::with_parent`].
///
/// # Example
///
/// ```rust
/// use pdfgraph::{Page, PdfWriter};
///
/// let mut writer = PdfWriter::new();
/// let mut page = Page::a4();
/// page.set_contents(b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET".to_vec());
/// writer.add_page(&page)?;
/// # Ok::<(), pdfgraph::PdfError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Page {
    media_box: Option<[f64; 4]>,
    crop_box: Option<[f64; 4]>,
    rotate: Option<i64>,
    resources: Option<Object>,
    contents: Option<Vec<u8>>,
    annotations: Vec<Object>,
    parent: Option<Object>,
}

impl Page {
    /// Page of the given size in points (1/72 inch)
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            media_box: Some([0.0, 0.0, width, height]),
            ..Default::default()
        }
    }

    /// A4 (595 x 842 points)
    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }

    /// US Letter (612 x 792 points)
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Attach to an existing page tree node; missing attributes are taken
    /// from it when the page is added.
    pub fn with_parent(mut self, parent: Object) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn set_media_box(&mut self, media_box: [f64; 4]) {
        self.media_box = Some(media_box);
    }

    pub fn set_crop_box(&mut self, crop_box: [f64; 4]) {
        self.crop_box = Some(crop_box);
    }

    /// Rotation in degrees, a multiple of 90
    pub fn set_rotation(&mut self, degrees: i64) {
        self.rotate = Some(degrees);
    }

    pub fn set_resources(&mut self, resources: impl Into<Object>) {
        self.resources = Some(resources.into());
    }

    /// Raw content stream of the page
    pub fn set_contents(&mut self, contents: Vec<u8>) {
        self.contents = Some(contents);
    }

    pub fn add_annotation(&mut self, annotation: Object) {
        self.annotations.push(annotation);
    }

    pub fn media_box(&self) -> Option<[f64; 4]> {
        self.media_box
    }
}

fn rectangle(rect: [f64; 4]) -> Object {
    Object::Array(rect.iter().map(|v| Object::Real(*v)).collect())
}

impl ToPdfObject for Page {
    fn to_pdf_object(&self, store: &mut ObjectStore) -> Object {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("Page"));

        if let Some(parent) = &self.parent {
            dict.set("Parent", parent.clone());
        }
        if let Some(media_box) = self.media_box {
            dict.set("MediaBox", rectangle(media_box));
        }
        if let Some(crop_box) = self.crop_box {
            dict.set("CropBox", rectangle(crop_box));
        }
        if let Some(rotate) = self.rotate {
            dict.set("Rotate", rotate);
        }
        if let Some(resources) = &self.resources {
            dict.set("Resources", resources.clone());
        }
        if let Some(contents) = &self.contents {
            let stream = store.add_stream(Stream::new(contents.clone()));
            dict.set("Contents", stream);
        }
        if !self.annotations.is_empty() {
            dict.set("Annots", self.annotations.clone());
        }

        store.add_indirect(dict)
    }
}
