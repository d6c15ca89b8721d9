//! PDF Content Stream Parser
//!
//! Splits a content stream into operations: an operator together with the
//! operands that precede it. Inline images (`BI` ... `ID` ... `EI`) are read
//! by a dedicated sub-parser because their payload is raw binary data whose
//! length is not declared anywhere.

use super::inline_image::InlineImage;
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, Unnumbered};

/// A single operation in a content stream
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOperation {
    /// `operands... operator`
    Operator {
        operator: String,
        operands: Vec<Object>,
    },
    /// `BI ... ID ... EI`
    InlineImage(InlineImage),
}

impl ContentOperation {
    pub fn new(operator: impl Into<String>, operands: Vec<Object>) -> Self {
        ContentOperation::Operator {
            operator: operator.into(),
            operands,
        }
    }

    /// The operator token; inline images report `BI`.
    pub fn operator(&self) -> &str {
        match self {
            ContentOperation::Operator { operator, .. } => operator,
            ContentOperation::InlineImage(_) => "BI",
        }
    }

    pub fn operands(&self) -> &[Object] {
        match self {
            ContentOperation::Operator { operands, .. } => operands,
            ContentOperation::InlineImage(_) => &[],
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ContentOperation::Operator { operator, operands } => {
                let mut out = Vec::new();
                for operand in operands {
                    operand.write_to(&mut out, &Unnumbered);
                    out.push(b' ');
                }
                out.extend_from_slice(operator.as_bytes());
                out.push(b'\n');
                out
            }
            ContentOperation::InlineImage(image) => image.to_bytes(),
        }
    }
}

/// Serialize a list of operations back into content-stream bytes.
pub fn operations_to_bytes(operations: &[ContentOperation]) -> Vec<u8> {
    operations.iter().flat_map(ContentOperation::to_bytes).collect()
}

/// Token types in content streams
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Name(String),
    Operator(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
}

/// PDF white-space characters (ISO 32000-1 Table 1)
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Progress of the search for the `<ws>EI<ws>` terminator of inline image data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Data,
    Whitespace,
    SawE,
    SawEI,
}

/// Content stream tokenizer
pub struct ContentTokenizer<'a> {
    input: &'a [u8],
    position: usize,
}

impl<'a> ContentTokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Get the next token from the stream
    pub fn next_token(&mut self) -> ParseResult<Option<Token>> {
        self.skip_whitespace();

        if self.position >= self.input.len() {
            return Ok(None);
        }

        let ch = self.input[self.position];

        match ch {
            // Numbers
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(),

            // Strings
            b'(' => self.read_literal_string(),
            b'<' => {
                if self.peek_next() == Some(b'<') {
                    self.position += 2;
                    Ok(Some(Token::DictStart))
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.peek_next() == Some(b'>') {
                    self.position += 2;
                    Ok(Some(Token::DictEnd))
                } else {
                    Err(self.syntax_error("Unexpected '>'"))
                }
            }

            // Arrays
            b'[' => {
                self.position += 1;
                Ok(Some(Token::ArrayStart))
            }
            b']' => {
                self.position += 1;
                Ok(Some(Token::ArrayEnd))
            }

            // Names
            b'/' => self.read_name(),

            // Operators or other tokens
            _ => self.read_operator(),
        }
    }

    /// Read raw inline image data. Must be called right after the `ID`
    /// operator; consumes everything up to and including the first
    /// `<ws>EI<ws>` sequence and returns the bytes before it.
    pub fn read_inline_image_data(&mut self) -> ParseResult<Vec<u8>> {
        let start = self.position;

        // a single white-space byte separates ID from the data
        if self.position < self.input.len() && is_whitespace(self.input[self.position]) {
            self.position += 1;
        }

        let mut data = Vec::new();
        let mut candidate: Vec<u8> = Vec::with_capacity(4);
        let mut state = ScanState::Data;

        while self.position < self.input.len() {
            let c = self.input[self.position];
            self.position += 1;

            state = match state {
                ScanState::Data if is_whitespace(c) => {
                    candidate.push(c);
                    ScanState::Whitespace
                }
                ScanState::Data => {
                    data.push(c);
                    ScanState::Data
                }
                ScanState::Whitespace if c == b'E' => {
                    candidate.push(c);
                    ScanState::SawE
                }
                ScanState::SawE if c == b'I' => {
                    candidate.push(c);
                    ScanState::SawEI
                }
                ScanState::SawEI if is_whitespace(c) => {
                    tracing::trace!("inline image data: {} bytes", data.len());
                    return Ok(data);
                }
                // The candidate was data after all. A white-space byte
                // restarts the search, so of a white-space run only the
                // byte right before `EI` belongs to the terminator.
                _ => {
                    data.append(&mut candidate);
                    if is_whitespace(c) {
                        candidate.push(c);
                        ScanState::Whitespace
                    } else {
                        data.push(c);
                        ScanState::Data
                    }
                }
            };
        }

        tracing::debug!("unable to find end of inline image data");
        Err(ParseError::UnterminatedInlineImage { position: start })
    }

    fn syntax_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::SyntaxError {
            position: self.position,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.position < self.input.len() {
            match self.input[self.position] {
                b'%' => self.skip_comment(),
                b if is_whitespace(b) => self.position += 1,
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        while self.position < self.input.len()
            && self.input[self.position] != b'\n'
            && self.input[self.position] != b'\r'
        {
            self.position += 1;
        }
    }

    fn peek_next(&self) -> Option<u8> {
        self.input.get(self.position + 1).copied()
    }

    fn read_number(&mut self) -> ParseResult<Option<Token>> {
        let start = self.position;
        let mut has_dot = false;

        // Handle optional sign
        if matches!(self.input[self.position], b'+' | b'-') {
            self.position += 1;
        }

        // Read digits and optional decimal point
        while self.position < self.input.len() {
            match self.input[self.position] {
                b'0'..=b'9' => self.position += 1,
                b'.' if !has_dot => {
                    has_dot = true;
                    self.position += 1;
                }
                _ => break,
            }
        }

        let num_str = std::str::from_utf8(&self.input[start..self.position]).map_err(|_| {
            ParseError::SyntaxError {
                position: start,
                message: "Invalid number format".to_string(),
            }
        })?;

        if has_dot {
            let value = num_str.parse::<f64>().map_err(|_| ParseError::SyntaxError {
                position: start,
                message: format!("Invalid real number {num_str:?}"),
            })?;
            Ok(Some(Token::Real(value)))
        } else {
            let value = num_str.parse::<i64>().map_err(|_| ParseError::SyntaxError {
                position: start,
                message: format!("Invalid integer number {num_str:?}"),
            })?;
            Ok(Some(Token::Integer(value)))
        }
    }

    fn read_literal_string(&mut self) -> ParseResult<Option<Token>> {
        let start = self.position;
        self.position += 1; // Skip opening '('
        let mut result = Vec::new();
        let mut paren_depth = 1;
        let mut escape = false;

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            self.position += 1;

            if escape {
                match ch {
                    b'n' => result.push(b'\n'),
                    b'r' => result.push(b'\r'),
                    b't' => result.push(b'\t'),
                    b'b' => result.push(b'\x08'),
                    b'f' => result.push(b'\x0C'),
                    b'(' | b')' | b'\\' => result.push(ch),
                    b'0'..=b'7' => {
                        self.position -= 1;
                        result.push(self.read_octal_escape());
                    }
                    // line continuation
                    b'\n' => {}
                    b'\r' => {
                        if self.input.get(self.position) == Some(&b'\n') {
                            self.position += 1;
                        }
                    }
                    _ => result.push(ch),
                }
                escape = false;
            } else {
                match ch {
                    b'\\' => escape = true,
                    b'(' => {
                        paren_depth += 1;
                        result.push(ch);
                    }
                    b')' => {
                        paren_depth -= 1;
                        if paren_depth == 0 {
                            return Ok(Some(Token::String(result)));
                        }
                        result.push(ch);
                    }
                    _ => result.push(ch),
                }
            }
        }

        Err(ParseError::SyntaxError {
            position: start,
            message: "Unterminated literal string".to_string(),
        })
    }

    fn read_octal_escape(&mut self) -> u8 {
        let mut value = 0u8;
        let mut count = 0;

        while count < 3 && self.position < self.input.len() {
            match self.input[self.position] {
                d @ b'0'..=b'7' => {
                    value = value.wrapping_mul(8).wrapping_add(d - b'0');
                    self.position += 1;
                    count += 1;
                }
                _ => break,
            }
        }

        value
    }

    fn read_hex_string(&mut self) -> ParseResult<Option<Token>> {
        self.position += 1; // Skip opening '<'
        let mut result = Vec::new();
        let mut nibble = None;

        while self.position < self.input.len() {
            let ch = self.input[self.position];

            match ch {
                b'>' => {
                    self.position += 1;
                    // Handle odd number of hex digits
                    if let Some(n) = nibble {
                        result.push(n << 4);
                    }
                    return Ok(Some(Token::HexString(result)));
                }
                b'0'..=b'9' | b'A'..=b'F' | b'a'..=b'f' => {
                    let digit = match ch {
                        b'0'..=b'9' => ch - b'0',
                        b'A'..=b'F' => ch - b'A' + 10,
                        _ => ch - b'a' + 10,
                    };

                    if let Some(n) = nibble.take() {
                        result.push((n << 4) | digit);
                    } else {
                        nibble = Some(digit);
                    }
                    self.position += 1;
                }
                b if is_whitespace(b) => self.position += 1,
                _ => {
                    return Err(self.syntax_error(format!(
                        "Invalid character in hex string: {:?}",
                        ch as char
                    )));
                }
            }
        }

        Err(self.syntax_error("Unterminated hex string"))
    }

    fn read_name(&mut self) -> ParseResult<Option<Token>> {
        self.position += 1; // Skip '/'
        let start = self.position;

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;
        }

        let name = self.decode_name(&self.input[start..self.position])?;
        Ok(Some(Token::Name(name)))
    }

    fn decode_name(&self, bytes: &[u8]) -> ParseResult<String> {
        let mut result = Vec::with_capacity(bytes.len());
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == b'#' && i + 2 < bytes.len() {
                let value = std::str::from_utf8(&bytes[i + 1..i + 3])
                    .ok()
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                    .ok_or_else(|| self.syntax_error("Invalid hex escape in name"))?;
                result.push(value);
                i += 3;
            } else {
                result.push(bytes[i]);
                i += 1;
            }
        }

        String::from_utf8(result).map_err(|_| self.syntax_error("Invalid UTF-8 in name"))
    }

    fn read_operator(&mut self) -> ParseResult<Option<Token>> {
        let start = self.position;

        while self.position < self.input.len() {
            let ch = self.input[self.position];
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;
        }

        if self.position == start {
            return Err(self.syntax_error(format!(
                "Unexpected character {:?}",
                self.input[start] as char
            )));
        }

        let op = std::str::from_utf8(&self.input[start..self.position]).map_err(|_| {
            ParseError::SyntaxError {
                position: start,
                message: "Invalid operator".to_string(),
            }
        })?;

        Ok(Some(Token::Operator(op.to_string())))
    }
}

/// One syntactic item: an operand value or an operator keyword
#[derive(Debug, Clone, PartialEq)]
enum Item {
    Operand(Object),
    Operator(String),
}

/// Content stream parser
pub struct ContentParser<'a> {
    tokenizer: ContentTokenizer<'a>,
}

impl<'a> ContentParser<'a> {
    /// Create a new content parser
    pub fn new(content: &'a [u8]) -> Self {
        Self {
            tokenizer: ContentTokenizer::new(content),
        }
    }

    /// Parse a content stream into a vector of operations
    pub fn parse(content: &[u8]) -> ParseResult<Vec<ContentOperation>> {
        ContentParser::new(content).parse_operations()
    }

    /// Parse the remaining input into operations
    pub fn parse_operations(&mut self) -> ParseResult<Vec<ContentOperation>> {
        let mut operations = Vec::new();
        let mut operands: Vec<Object> = Vec::new();

        while let Some(item) = self.next_item()? {
            match item {
                Item::Operand(obj) => operands.push(obj),
                Item::Operator(op) if op == "BI" => {
                    if !operands.is_empty() {
                        tracing::debug!("discarding {} operands before BI", operands.len());
                        operands.clear();
                    }
                    let image = self.parse_inline_image()?;
                    operations.push(ContentOperation::InlineImage(image));
                }
                Item::Operator(operator) => {
                    operations.push(ContentOperation::Operator {
                        operator,
                        operands: std::mem::take(&mut operands),
                    });
                }
            }
        }

        if !operands.is_empty() {
            tracing::debug!("{} trailing operands without operator", operands.len());
        }

        Ok(operations)
    }

    fn next_item(&mut self) -> ParseResult<Option<Item>> {
        match self.tokenizer.next_token()? {
            None => Ok(None),
            Some(token) => self.item_from_token(token).map(Some),
        }
    }

    fn item_from_token(&mut self, token: Token) -> ParseResult<Item> {
        let obj = match token {
            Token::Integer(i) => Object::Integer(i),
            Token::Real(r) => Object::Real(r),
            Token::String(s) | Token::HexString(s) => Object::String(s),
            Token::Name(n) => Object::Name(n),
            Token::ArrayStart => self.read_array()?,
            Token::DictStart => self.read_dictionary()?,
            Token::Operator(op) => match op.as_str() {
                "true" => Object::Boolean(true),
                "false" => Object::Boolean(false),
                "null" => Object::Null,
                _ => return Ok(Item::Operator(op)),
            },
            Token::ArrayEnd | Token::DictEnd => {
                return Err(ParseError::SyntaxError {
                    position: self.tokenizer.position(),
                    message: format!("Unexpected {token:?}"),
                })
            }
        };
        Ok(Item::Operand(obj))
    }

    /// Read an operand; operators are not allowed here
    fn next_operand(&mut self, context: &str) -> ParseResult<Object> {
        let position = self.tokenizer.position();
        match self.next_item()? {
            Some(Item::Operand(obj)) => Ok(obj),
            Some(Item::Operator(op)) => Err(ParseError::SyntaxError {
                position,
                message: format!("Unexpected operator {op} in {context}"),
            }),
            None => Err(ParseError::SyntaxError {
                position,
                message: format!("Unexpected end of content in {context}"),
            }),
        }
    }

    fn read_array(&mut self) -> ParseResult<Object> {
        let mut items = Vec::new();
        loop {
            match self.tokenizer.next_token()? {
                Some(Token::ArrayEnd) => return Ok(Object::Array(items)),
                Some(token) => match self.item_from_token(token)? {
                    Item::Operand(obj) => items.push(obj),
                    Item::Operator(op) => {
                        return Err(self.tokenizer.syntax_error(format!(
                            "Unexpected operator {op} in array"
                        )))
                    }
                },
                None => return Err(self.tokenizer.syntax_error("Unterminated array")),
            }
        }
    }

    fn read_dictionary(&mut self) -> ParseResult<Object> {
        let mut dict = Dictionary::new();
        loop {
            match self.tokenizer.next_token()? {
                Some(Token::DictEnd) => return Ok(Object::Dictionary(dict)),
                Some(Token::Name(key)) => {
                    let value = self.next_operand("dictionary")?;
                    dict.set(key, value);
                }
                Some(other) => {
                    return Err(self.tokenizer.syntax_error(format!(
                        "Expected name as dictionary key, found {other:?}"
                    )))
                }
                None => return Err(self.tokenizer.syntax_error("Unterminated dictionary")),
            }
        }
    }

    /// Parse the body of an inline image; `BI` has already been consumed.
    fn parse_inline_image(&mut self) -> ParseResult<InlineImage> {
        let mut image = InlineImage::new();

        loop {
            let position = self.tokenizer.position();
            match self.next_item()? {
                Some(Item::Operand(Object::Name(key))) => {
                    let value = self.next_operand("inline image parameters")?;
                    image.set_parameter(&key, value)?;
                }
                Some(Item::Operand(other)) => {
                    return Err(ParseError::SyntaxError {
                        position,
                        message: format!(
                            "Invalid inline image property (expecting name), found {}",
                            other.type_name()
                        ),
                    })
                }
                Some(Item::Operator(op)) if op == "ID" => {
                    image.data = self.tokenizer.read_inline_image_data()?;
                    return Ok(image);
                }
                Some(Item::Operator(op)) if op == "EI" => {
                    tracing::trace!("inline image without data");
                    return Ok(image);
                }
                Some(Item::Operator(op)) => {
                    return Err(ParseError::SyntaxError {
                        position,
                        message: format!("Unexpected operator {op} in inline image"),
                    })
                }
                None => return Err(ParseError::UnterminatedInlineImage { position }),
            }
        }
    }
}

/// Extract the text shown by `Tj` and `TJ` inside text objects.
///
/// Character codes are taken verbatim, one `char` per byte, without font
/// encoding or CMap resolution. `Td`, `TD` and `T*` start a new line.
pub fn extract_text(content: &[u8]) -> ParseResult<String> {
    extract_text_from_operations(&ContentParser::parse(content)?)
}

pub fn extract_text_from_operations(operations: &[ContentOperation]) -> ParseResult<String> {
    let mut in_text = false;
    let mut text = String::new();

    for op in operations {
        match op.operator() {
            "BT" => in_text = true,
            "ET" => in_text = false,
            "Td" | "TD" | "T*" => text.push('\n'),
            "Tj" if in_text => match op.operands().first() {
                None => {}
                Some(Object::String(s)) => push_codes(&mut text, s),
                Some(other) => return Err(invalid_operand("Tj", "string", other)),
            },
            "TJ" if in_text => match op.operands().first() {
                None => {}
                Some(Object::Array(items)) => {
                    for item in items {
                        if let Object::String(s) = item {
                            push_codes(&mut text, s);
                        }
                    }
                }
                Some(other) => return Err(invalid_operand("TJ", "array", other)),
            },
            _ => {}
        }
    }

    Ok(text)
}

fn push_codes(text: &mut String, codes: &[u8]) {
    text.extend(codes.iter().map(|&b| b as char));
}

fn invalid_operand(operator: &str, expected: &'static str, found: &Object) -> ParseError {
    ParseError::InvalidOperand {
        operator: operator.to_string(),
        expected,
        found: found.type_name(),
    }
}
