//! Page resources needed while interpreting a content stream.

use crate::objects::{Dictionary, Object, ObjectStore};
use std::collections::HashMap;

/// A colorspace known by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Colorspace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
    /// Any other family; only the component count is tracked
    Custom { family: String, components: usize },
}

impl Colorspace {
    pub fn num_components(&self) -> usize {
        match self {
            Colorspace::DeviceGray => 1,
            Colorspace::DeviceRgb => 3,
            Colorspace::DeviceCmyk => 4,
            Colorspace::Custom { components, .. } => *components,
        }
    }

    /// Interpret a colorspace object from a `ColorSpace` resource dictionary.
    /// Returns `None` for shapes whose component count cannot be derived.
    pub fn from_object(obj: &Object, store: &ObjectStore) -> Option<Self> {
        match store.resolve(obj) {
            Object::Name(name) => Self::from_family(name, None),
            Object::Array(items) => {
                let family = items.first()?.as_name()?;
                Self::from_family(family, items.get(1).map(|p| store.resolve(p)))
            }
            _ => None,
        }
    }

    fn from_family(family: &str, param: Option<&Object>) -> Option<Self> {
        let custom = |components| {
            Some(Colorspace::Custom {
                family: family.to_string(),
                components,
            })
        };
        match family {
            "DeviceGray" | "CalGray" => Some(Colorspace::DeviceGray),
            "DeviceRGB" | "CalRGB" => Some(Colorspace::DeviceRgb),
            "DeviceCMYK" => Some(Colorspace::DeviceCmyk),
            "Lab" => custom(3),
            "Indexed" | "Separation" | "Pattern" => custom(1),
            "DeviceN" => match param {
                Some(Object::Array(names)) => custom(names.len()),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Named resources of a page, as far as content-stream decoding needs them
#[derive(Debug, Clone, Default)]
pub struct PageResources {
    colorspaces: HashMap<String, Colorspace>,
}

impl PageResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the `ColorSpace` entries of a `Resources` dictionary.
    /// Entries that cannot be interpreted are skipped.
    pub fn from_dictionary(resources: &Dictionary, store: &ObjectStore) -> Self {
        let mut page_resources = Self::new();
        let colorspaces = resources
            .get("ColorSpace")
            .map(|cs| store.resolve(cs))
            .and_then(Object::as_dict);

        if let Some(colorspaces) = colorspaces {
            for (name, obj) in colorspaces.iter() {
                match Colorspace::from_object(obj, store) {
                    Some(cs) => page_resources.add_colorspace(name.clone(), cs),
                    None => tracing::debug!("skipping colorspace resource /{name}"),
                }
            }
        }

        page_resources
    }

    pub fn add_colorspace(&mut self, name: impl Into<String>, colorspace: Colorspace) {
        self.colorspaces.insert(name.into(), colorspace);
    }

    pub fn colorspace(&self, name: &str) -> Option<&Colorspace> {
        self.colorspaces.get(name)
    }
}
