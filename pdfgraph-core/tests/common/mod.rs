//! Helpers for inspecting written documents.

#![allow(dead_code)]

use pdfgraph::PdfWriter;
use std::io::Cursor;

pub fn write_to_vec(writer: &mut PdfWriter) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    writer.write(&mut cursor).expect("write document");
    cursor.into_inner()
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub fn contains(haystack: &[u8], needle: &str) -> bool {
    find(haystack, needle.as_bytes()).is_some()
}

/// Offset of the xref table as announced after `startxref`
pub fn startxref(bytes: &[u8]) -> usize {
    let marker = b"startxref\n";
    let pos = bytes
        .windows(marker.len())
        .rposition(|w| w == marker)
        .expect("startxref marker");
    let digits: String = bytes[pos + marker.len()..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .map(|b| *b as char)
        .collect();
    digits.parse().expect("startxref offset")
}

/// The xref entries, each exactly as written (20 bytes)
pub fn xref_entries(bytes: &[u8]) -> Vec<String> {
    let start = startxref(bytes);
    assert!(bytes[start..].starts_with(b"xref\n"), "startxref points at xref");

    let header_start = start + 5;
    let header_len = find(&bytes[header_start..], b"\n").expect("subsection header");
    let header = std::str::from_utf8(&bytes[header_start..header_start + header_len]).unwrap();
    let mut parts = header.split(' ');
    assert_eq!(parts.next(), Some("0"));
    let count: usize = parts.next().unwrap().parse().unwrap();

    let mut pos = header_start + header_len + 1;
    (0..count)
        .map(|_| {
            let entry = String::from_utf8(bytes[pos..pos + 20].to_vec()).unwrap();
            pos += 20;
            entry
        })
        .collect()
}

/// Byte offset of object `number`, read from the xref table
pub fn object_offset(bytes: &[u8], number: u32) -> usize {
    let entries = xref_entries(bytes);
    entries[number as usize][..10].parse().unwrap()
}

/// Raw data of the stream object `number`, given its expected length
pub fn stream_data(bytes: &[u8], number: u32, len: usize) -> Vec<u8> {
    let offset = object_offset(bytes, number);
    let start = offset + find(&bytes[offset..], b">>\nstream\n").expect("stream keyword") + 10;
    assert!(
        bytes[start + len..].starts_with(b"\nendstream"),
        "stream {number} is not {len} bytes long"
    );
    bytes[start..start + len].to_vec()
}
