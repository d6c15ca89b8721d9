//! Inline images (`BI` ... `ID` ... `EI`) as found in content streams.
//!
//! An inline image is not an object of its own; it lives inside the content
//! stream as a parameter list followed by raw sample data. Only the
//! abbreviated parameter keys of ISO 32000-1 Table 93 are accepted.

use super::filters;
use super::resources::PageResources;
use super::{ParseError, ParseResult};
use crate::objects::Object;

/// Parameters and payload of an inline image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineImage {
    pub bits_per_component: Option<Object>,
    pub color_space: Option<Object>,
    pub decode: Option<Object>,
    pub decode_parms: Option<Object>,
    pub filter: Option<Object>,
    pub height: Option<Object>,
    pub image_mask: Option<Object>,
    pub intent: Option<Object>,
    pub interpolate: Option<Object>,
    pub width: Option<Object>,
    /// Raw bytes between `ID` and `EI`, still filter-encoded
    pub data: Vec<u8>,
}

/// Decoded samples of an inline image with its geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub width: i64,
    pub height: i64,
    pub bits_per_component: i64,
    pub color_components: usize,
    pub data: Vec<u8>,
}

impl InlineImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one `key value` pair from the parameter section.
    pub fn set_parameter(&mut self, key: &str, value: Object) -> ParseResult<()> {
        let slot = match key {
            "BPC" => &mut self.bits_per_component,
            "CS" => &mut self.color_space,
            "D" => &mut self.decode,
            "DP" => &mut self.decode_parms,
            "F" => &mut self.filter,
            "H" => &mut self.height,
            "IM" => &mut self.image_mask,
            "Intent" => &mut self.intent,
            "I" => &mut self.interpolate,
            "W" => &mut self.width,
            _ => return Err(ParseError::UnknownInlineImageParameter(key.to_string())),
        };
        *slot = Some(value);
        Ok(())
    }

    /// Parameters that are set, in canonical key order
    pub fn parameters(&self) -> Vec<(&'static str, &Object)> {
        [
            ("BPC", &self.bits_per_component),
            ("CS", &self.color_space),
            ("D", &self.decode),
            ("DP", &self.decode_parms),
            ("F", &self.filter),
            ("H", &self.height),
            ("IM", &self.image_mask),
            ("Intent", &self.intent),
            ("I", &self.interpolate),
            ("W", &self.width),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key, v)))
        .collect()
    }

    /// Content-stream form: `BI /K v ... ID <data> EI`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = b"BI\n".to_vec();
        for (key, value) in self.parameters() {
            out.push(b'/');
            out.extend_from_slice(key.as_bytes());
            out.push(b' ');
            value.write_to(&mut out, &crate::objects::Unnumbered);
            out.push(b'\n');
        }
        out.extend_from_slice(b"ID ");
        out.extend_from_slice(&self.data);
        out.extend_from_slice(b"\nEI\n");
        out
    }

    /// Number of color components, from the `CS` parameter or the page's
    /// named colorspaces. Defaults to one (gray) when `CS` is absent.
    pub fn color_components(&self, resources: &PageResources) -> ParseResult<usize> {
        let name = match &self.color_space {
            None => {
                tracing::debug!("inline image has no colorspace, assuming gray");
                return Ok(1);
            }
            Some(Object::Name(name)) => name.as_str(),
            Some(other) => {
                return Err(ParseError::InvalidImageParameter {
                    key: "CS".to_string(),
                    expected: "name",
                    found: other.type_name(),
                })
            }
        };

        match name {
            "G" | "DeviceGray" => Ok(1),
            "RGB" | "DeviceRGB" => Ok(3),
            "CMYK" | "DeviceCMYK" => Ok(4),
            "I" => Err(ParseError::UnsupportedColorspace(name.to_string())),
            _ => resources
                .colorspace(name)
                .map(|cs| cs.num_components())
                .ok_or_else(|| ParseError::UnknownColorspace(name.to_string())),
        }
    }

    /// Decode the payload and resolve the image geometry.
    pub fn to_image(&self, resources: &PageResources) -> ParseResult<Image> {
        let data = filters::decode(&self.data, self.filter.as_ref())?;

        let height = required_integer("H", self.height.as_ref(), ParseError::MissingHeight)?;
        let width = required_integer("W", self.width.as_ref(), ParseError::MissingWidth)?;

        let bits_per_component = match &self.bits_per_component {
            None => {
                tracing::debug!("inline image bits per component missing, assuming 8");
                8
            }
            Some(obj) => obj.as_integer().ok_or_else(|| ParseError::InvalidImageParameter {
                key: "BPC".to_string(),
                expected: "integer",
                found: obj.type_name(),
            })?,
        };

        let color_components = self.color_components(resources)?;

        Ok(Image {
            width,
            height,
            bits_per_component,
            color_components,
            data,
        })
    }
}

fn required_integer(key: &str, value: Option<&Object>, missing: ParseError) -> ParseResult<i64> {
    match value {
        None => Err(missing),
        Some(Object::Integer(i)) => Ok(*i),
        Some(other) => Err(ParseError::InvalidImageParameter {
            key: key.to_string(),
            expected: "integer",
            found: other.type_name(),
        }),
    }
}
