//! Stream filters
//!
//! Decoders for the filters of ISO 32000-1 Section 7.4 that carry no
//! image-specific parameters. Inline images may use the abbreviated names.

use super::{ParseError, ParseResult};
use crate::objects::{Object, Stream};

#[cfg(feature = "compression")]
use flate2::read::ZlibDecoder;
#[cfg(feature = "compression")]
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    ASCIIHexDecode,
    ASCII85Decode,
    FlateDecode,
    RunLengthDecode,
}

impl Filter {
    /// Look up a filter by its full or abbreviated name
    pub fn from_name(name: &str) -> Option<Self> {
        let filter = match name {
            "ASCIIHexDecode" | "AHx" => Self::ASCIIHexDecode,
            "ASCII85Decode" | "A85" => Self::ASCII85Decode,
            "FlateDecode" | "Fl" => Self::FlateDecode,
            "RunLengthDecode" | "RL" => Self::RunLengthDecode,
            _ => return None,
        };
        Some(filter)
    }

    pub fn decode(self, data: &[u8]) -> ParseResult<Vec<u8>> {
        match self {
            Self::ASCIIHexDecode => decode_ascii_hex(data),
            Self::ASCII85Decode => decode_ascii85(data),
            Self::FlateDecode => decode_flate(data),
            Self::RunLengthDecode => decode_run_length(data),
        }
    }
}

/// Decode a stream's data with the filters named by its `Filter` entry
pub fn decode_stream(stream: &Stream) -> ParseResult<Vec<u8>> {
    decode(stream.data(), stream.dictionary().get("Filter"))
}

/// Run `data` through `filter`, which is absent, a single name or an array
/// of names applied first to last.
pub fn decode(data: &[u8], filter: Option<&Object>) -> ParseResult<Vec<u8>> {
    let names: Vec<&str> = match filter {
        None | Some(Object::Null) => return Ok(data.to_vec()),
        Some(Object::Name(name)) => vec![name.as_str()],
        Some(Object::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_name().ok_or_else(|| {
                    decode_error(format!("filter array holds {}", item.type_name()))
                })
            })
            .collect::<ParseResult<_>>()?,
        Some(other) => {
            return Err(decode_error(format!(
                "/Filter must be a name or an array, found {}",
                other.type_name()
            )))
        }
    };

    names.into_iter().try_fold(data.to_vec(), |bytes, name| {
        let filter =
            Filter::from_name(name).ok_or_else(|| ParseError::UnsupportedFilter(name.to_string()))?;
        filter.decode(&bytes)
    })
}

fn decode_error(message: impl Into<String>) -> ParseError {
    ParseError::StreamDecodeError(message.into())
}

#[cfg(feature = "compression")]
fn decode_flate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| decode_error(format!("FlateDecode: {e}")))?;
    Ok(out)
}

#[cfg(not(feature = "compression"))]
fn decode_flate(_data: &[u8]) -> ParseResult<Vec<u8>> {
    Err(ParseError::UnsupportedFilter(
        "FlateDecode (built without the compression feature)".to_string(),
    ))
}

/// ASCIIHexDecode. White-space is skipped, `>` ends the data and a lone
/// final digit is read as if followed by `0`.
fn decode_ascii_hex(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &b in data {
        if b == b'>' {
            break;
        }
        if b.is_ascii_whitespace() {
            continue;
        }
        let nibble = (b as char)
            .to_digit(16)
            .ok_or_else(|| decode_error(format!("ASCIIHexDecode: bad digit {:?}", b as char)))?
            as u8;
        match high.take() {
            Some(h) => out.push((h << 4) | nibble),
            None => high = Some(nibble),
        }
    }

    if let Some(h) = high {
        out.push(h << 4);
    }
    Ok(out)
}

/// ASCII85Decode, with an optional `<~` prefix and `~>` as end marker.
fn decode_ascii85(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut bytes = data.iter().copied().filter(|b| !b.is_ascii_whitespace()).peekable();
    if bytes.peek() == Some(&b'<') {
        bytes.next();
        if bytes.next() != Some(b'~') {
            return Err(decode_error("ASCII85Decode: malformed <~ prefix"));
        }
    }

    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut filled = 0;

    while let Some(b) = bytes.next() {
        match b {
            b'~' => {
                if bytes.next() != Some(b'>') {
                    return Err(decode_error("ASCII85Decode: malformed ~> marker"));
                }
                break;
            }
            b'z' if filled == 0 => out.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[filled] = b - b'!';
                filled += 1;
                if filled == 5 {
                    out.extend_from_slice(&base85_value(&group).to_be_bytes());
                    filled = 0;
                }
            }
            _ => {
                return Err(decode_error(format!(
                    "ASCII85Decode: unexpected {:?}",
                    b as char
                )))
            }
        }
    }

    if filled > 0 {
        // a short group of n digits encodes n - 1 bytes, padded with 'u'
        group[filled..].fill(b'u' - b'!');
        out.extend_from_slice(&base85_value(&group).to_be_bytes()[..filled - 1]);
    }
    Ok(out)
}

fn base85_value(digits: &[u8; 5]) -> u32 {
    digits
        .iter()
        .fold(0u32, |acc, &d| acc.wrapping_mul(85).wrapping_add(u32::from(d)))
}

/// RunLengthDecode. A length byte below 128 copies the next `n + 1` bytes,
/// above 128 repeats the next byte `257 - n` times, 128 ends the data.
fn decode_run_length(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut rest = data;

    while let Some((&length, tail)) = rest.split_first() {
        match length {
            128 => break,
            0..=127 => {
                let count = usize::from(length) + 1;
                if tail.len() < count {
                    return Err(decode_error("RunLengthDecode: literal run past end of data"));
                }
                out.extend_from_slice(&tail[..count]);
                rest = &tail[count..];
            }
            _ => {
                let (&byte, tail) = tail
                    .split_first()
                    .ok_or_else(|| decode_error("RunLengthDecode: repeat without a byte"))?;
                out.resize(out.len() + 257 - usize::from(length), byte);
                rest = tail;
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Dictionary;

    #[test]
    fn test_ascii_hex_decode() {
        let data = b"48656C6C6F>";
        let result = decode_ascii_hex(data).unwrap();
        assert_eq!(result, b"Hello");

        let data = b"48 65 6C 6C 6F>"; // With spaces
        let result = decode_ascii_hex(data).unwrap();
        assert_eq!(result, b"Hello");

        let data = b"48656C6C6>"; // Odd number of digits
        let result = decode_ascii_hex(data).unwrap();
        assert_eq!(result, b"Hell`");
    }

    #[test]
    fn test_ascii85_decode() {
        let data = b"87cURD]j7BEbo80~>";
        let result = decode_ascii85(data).unwrap();
        assert_eq!(result, b"Hello world!");

        let data = b"<~87cURD]j7BEbo80~>";
        assert_eq!(decode_ascii85(data).unwrap(), b"Hello world!");

        let data = b"z~>"; // Special case for zeros
        let result = decode_ascii85(data).unwrap();
        assert_eq!(result, &[0, 0, 0, 0]);
    }

    #[test]
    fn test_ascii85_partial_group() {
        // "Hi" encodes to a three character group
        assert_eq!(decode_ascii85(b"88/~>").unwrap(), b"Hi");
    }

    #[test]
    fn test_run_length_decode() {
        // literal run of 3, repeat 'x' 4 times, EOD
        let data = [2, b'a', b'b', b'c', 253, b'x', 128, b'z'];
        assert_eq!(decode_run_length(&data).unwrap(), b"abcxxxx");
    }

    #[test]
    fn test_run_length_truncated() {
        assert!(decode_run_length(&[5, b'a']).is_err());
        assert!(decode_run_length(&[200]).is_err());
    }

    #[test]
    fn test_filter_from_name() {
        assert_eq!(Filter::from_name("ASCIIHexDecode"), Some(Filter::ASCIIHexDecode));
        assert_eq!(Filter::from_name("AHx"), Some(Filter::ASCIIHexDecode));
        assert_eq!(Filter::from_name("A85"), Some(Filter::ASCII85Decode));
        assert_eq!(Filter::from_name("Fl"), Some(Filter::FlateDecode));
        assert_eq!(Filter::from_name("RL"), Some(Filter::RunLengthDecode));
        assert_eq!(Filter::from_name("DCTDecode"), None);
        assert_eq!(Filter::from_name("UnknownFilter"), None);
    }

    #[test]
    fn test_decode_no_filter() {
        let data = b"Hello, world!";
        assert_eq!(decode(data, None).unwrap(), data);
        assert_eq!(decode_stream(&Stream::new(data.to_vec())).unwrap(), data);
    }

    #[test]
    fn test_decode_stream_single_filter() {
        let mut dict = Dictionary::new();
        dict.set("Filter", Object::name("ASCIIHexDecode"));
        let stream = Stream::with_dictionary(dict, b"48656C6C6F>".to_vec());

        assert_eq!(decode_stream(&stream).unwrap(), b"Hello");
    }

    #[test]
    fn test_decode_filter_chain_in_order() {
        // hex of the ASCII85 text "87cURD]j7BEbo80~>"
        let a85 = b"87cURD]j7BEbo80~>";
        let hex: String = a85.iter().map(|b| format!("{b:02X}")).collect();
        let chain = Object::Array(vec![Object::name("AHx"), Object::name("A85")]);

        assert_eq!(decode(hex.as_bytes(), Some(&chain)).unwrap(), b"Hello world!");
    }

    #[test]
    fn test_decode_unsupported_filter() {
        let result = decode(b"test data", Some(&Object::name("DCTDecode")));
        assert!(matches!(result, Err(ParseError::UnsupportedFilter(ref n)) if n == "DCTDecode"));
    }

    #[test]
    fn test_decode_invalid_filter_type() {
        let result = decode(b"test data", Some(&Object::Integer(42)));
        assert!(matches!(result, Err(ParseError::StreamDecodeError(_))));
    }

    #[test]
    fn test_ascii_hex_decode_invalid() {
        assert!(decode_ascii_hex(b"GG>").is_err());
    }

    #[test]
    fn test_ascii_hex_decode_no_terminator() {
        assert_eq!(decode_ascii_hex(b"48656C6C6F").unwrap(), b"Hello");
    }

    #[test]
    fn test_ascii85_decode_invalid() {
        assert!(decode_ascii85(b"invalid~>").is_err());
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_decode() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original = b"Hello, compressed world!";
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(decode(&compressed, Some(&Object::name("Fl"))).unwrap(), original);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_flate_decode_garbage() {
        assert!(decode_flate(b"not zlib").is_err());
    }
}
