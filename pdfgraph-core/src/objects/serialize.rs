//! Canonical byte form of PDF objects.

use crate::objects::{Dictionary, Object, ObjectId, ObjectRef};
use std::collections::HashMap;

/// Maps store handles to the object numbers assigned for one write pass.
pub trait ObjectNumbering {
    fn object_id(&self, handle: ObjectRef) -> Option<ObjectId>;
}

/// Numbering used outside a write pass, e.g. for content streams, where no
/// handle has a number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unnumbered;

impl ObjectNumbering for Unnumbered {
    fn object_id(&self, _handle: ObjectRef) -> Option<ObjectId> {
        None
    }
}

impl ObjectNumbering for HashMap<ObjectRef, ObjectId> {
    fn object_id(&self, handle: ObjectRef) -> Option<ObjectId> {
        self.get(&handle).copied()
    }
}

impl Object {
    /// Append the serialized form of this object to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>, numbering: &dyn ObjectNumbering) {
        match self {
            Object::Null => out.extend_from_slice(b"null"),
            Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
            Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
            Object::Real(f) => out.extend_from_slice(format_real(*f).as_bytes()),
            Object::String(s) => write_literal_string(out, s),
            Object::Name(n) => write_name(out, n),
            Object::Array(arr) => {
                out.push(b'[');
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        out.push(b' ');
                    }
                    obj.write_to(out, numbering);
                }
                out.push(b']');
            }
            Object::Dictionary(dict) => dict.write_to(out, numbering),
            Object::Reference(id) => out.extend_from_slice(id.to_string().as_bytes()),
            Object::Indirect(handle) | Object::Stream(handle) => {
                match numbering.object_id(*handle) {
                    Some(id) => out.extend_from_slice(id.to_string().as_bytes()),
                    None => {
                        tracing::warn!("object {handle} has no number, writing null");
                        out.extend_from_slice(b"null");
                    }
                }
            }
        }
    }

    /// Serialized form with no object numbering available.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out, &Unnumbered);
        out
    }
}

impl Dictionary {
    pub fn write_to(&self, out: &mut Vec<u8>, numbering: &dyn ObjectNumbering) {
        out.extend_from_slice(b"<<");
        for (key, value) in self.iter() {
            write_name(out, key);
            out.push(b' ');
            value.write_to(out, numbering);
            out.push(b'\n');
        }
        out.extend_from_slice(b">>");
    }
}

fn format_real(f: f64) -> String {
    if !f.is_finite() {
        return "0".to_string();
    }
    let s = format!("{f:.6}");
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn write_literal_string(out: &mut Vec<u8>, s: &[u8]) {
    out.push(b'(');
    for &b in s {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x08 => out.extend_from_slice(b"\\b"),
            0x0C => out.extend_from_slice(b"\\f"),
            _ => out.push(b),
        }
    }
    out.push(b')');
}

fn is_regular_name_char(b: u8) -> bool {
    (0x21..=0x7E).contains(&b)
        && !matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
        )
}

fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for &b in name.as_bytes() {
        if is_regular_name_char(b) {
            out.push(b);
        } else {
            out.extend_from_slice(format!("#{b:02X}").as_bytes());
        }
    }
}
