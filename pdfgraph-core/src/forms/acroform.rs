use crate::objects::{Dictionary, Object, ObjectStore, ToPdfObject};

/// Interactive form dictionary (AcroForm)
#[derive(Debug, Clone)]
pub struct AcroForm {
    /// Root fields, normally indirect field dictionaries
    pub fields: Vec<Object>,
    /// Need appearances flag
    pub need_appearances: bool,
    /// Signature flags
    pub sig_flags: Option<i32>,
    /// Default resources
    pub dr: Option<Object>,
    /// Default appearance
    pub da: Option<String>,
    /// Quadding
    pub q: Option<i32>,
}

impl AcroForm {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            need_appearances: true,
            sig_flags: None,
            dr: None,
            da: Some("/Helv 12 Tf 0 g".to_string()), // Default: Helvetica 12pt black
            q: None,
        }
    }

    pub fn add_field(&mut self, field: Object) {
        self.fields.push(field);
    }

    pub fn to_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Fields", self.fields.clone());
        dict.set("NeedAppearances", self.need_appearances);

        if let Some(sig_flags) = self.sig_flags {
            dict.set("SigFlags", sig_flags);
        }
        if let Some(dr) = &self.dr {
            dict.set("DR", dr.clone());
        }
        if let Some(da) = &self.da {
            dict.set("DA", Object::string(da.as_bytes()));
        }
        if let Some(q) = self.q {
            dict.set("Q", q);
        }

        dict
    }
}

impl Default for AcroForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ToPdfObject for AcroForm {
    fn to_pdf_object(&self, store: &mut ObjectStore) -> Object {
        store.add_indirect(self.to_dict())
    }
}
