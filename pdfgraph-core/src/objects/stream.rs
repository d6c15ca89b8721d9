#[cfg(feature = "compression")]
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object};

/// Stream body: a dictionary plus raw bytes. The bytes are emitted verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    dictionary: Dictionary,
    data: Vec<u8>,
}

impl Stream {
    pub fn new(data: Vec<u8>) -> Self {
        let mut dictionary = Dictionary::new();
        dictionary.set("Length", data.len() as i64);

        Self { dictionary, data }
    }

    pub fn with_dictionary(dictionary: Dictionary, data: Vec<u8>) -> Self {
        let mut dict = dictionary;
        dict.set("Length", data.len() as i64);

        Self {
            dictionary: dict,
            data,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.dictionary.set("Length", data.len() as i64);
        self.data = data;
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.dictionary.set("Filter", Object::name(filter));
    }

    #[cfg(feature = "compression")]
    pub fn compress_flate(&mut self) -> Result<()> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&self.data)
            .map_err(|e| PdfError::CompressionError(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| PdfError::CompressionError(e.to_string()))?;

        self.set_data(compressed);
        self.set_filter("FlateDecode");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_new() {
        let stream = Stream::new(vec![1, 2, 3, 4, 5]);
        assert_eq!(stream.data(), &[1, 2, 3, 4, 5]);
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(5)));
    }

    #[test]
    fn test_set_data_updates_length() {
        let mut dict = Dictionary::new();
        dict.set("Subtype", Object::name("Image"));
        let mut stream = Stream::with_dictionary(dict, vec![0xFF; 3]);
        stream.set_data(vec![0; 10]);

        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(10)));
        assert_eq!(stream.dictionary().get_name("Subtype"), Some("Image"));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_compress_flate() {
        let mut stream = Stream::new(b"BT /F1 12 Tf (Hello) Tj ET ".repeat(20));
        stream.compress_flate().unwrap();

        assert_eq!(stream.dictionary().get_name("Filter"), Some("FlateDecode"));
        assert_eq!(
            stream.dictionary().get("Length"),
            Some(&Object::Integer(stream.data().len() as i64))
        );
        assert!(stream.data().len() < 20 * 27);
    }
}
