use std::borrow::Cow;

use crate::errors::EncodingError;

pub(crate) const TAG_INTEGER: u8 = 0x02;
pub(crate) const TAG_OCTET_STRING: u8 = 0x04;
pub(crate) const TAG_NULL: u8 = 0x05;
pub(crate) const TAG_OID: u8 = 0x06;
pub(crate) const TAG_UTF8_STRING: u8 = 0x0C;
pub(crate) const TAG_IA5_STRING: u8 = 0x16;
pub(crate) const TAG_SEQUENCE: u8 = 0x30;
pub(crate) const TAG_SET: u8 = 0x31;

const CONSTRUCTED: u8 = 0x20;
const CLASS_MASK: u8 = 0xC0;
const CLASS_CONTEXT_SPECIFIC: u8 = 0x80;
const HIGH_TAG_NUMBER: u8 = 0x1F;
const LENGTH_INDEFINITE: u8 = 0x80;
const MAX_LENGTH_OCTETS: usize = 4;

/// Identifier octet of a context-specific tag `[number]`.
pub(crate) const fn context_tag(number: u8, constructed: bool) -> u8 {
    CLASS_CONTEXT_SPECIFIC | if constructed { CONSTRUCTED } else { 0 } | number
}

/// Standard classification of an element's identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ElementKind {
    Integer,
    OctetString,
    Null,
    ObjectIdentifier,
    Utf8String,
    Ia5String,
    Sequence,
    Set,
    ContextSpecific(u8),
    Other(u8),
}

impl ElementKind {
    fn of(tag: u8) -> Self {
        match tag {
            TAG_INTEGER => Self::Integer,
            // Segmented (constructed) octet strings are still octet strings.
            TAG_OCTET_STRING | 0x24 => Self::OctetString,
            TAG_NULL => Self::Null,
            TAG_OID => Self::ObjectIdentifier,
            TAG_UTF8_STRING => Self::Utf8String,
            TAG_IA5_STRING => Self::Ia5String,
            TAG_SEQUENCE => Self::Sequence,
            TAG_SET => Self::Set,
            t if t & CLASS_MASK == CLASS_CONTEXT_SPECIFIC => Self::ContextSpecific(t & HIGH_TAG_NUMBER),
            t => Self::Other(t),
        }
    }
}

/// Lazy reader over consecutive tag-length-value elements.
///
/// Definite lengths are checked against the remaining input before anything
/// is handed out; indefinite lengths (BER) are accepted for constructed
/// elements and resolved by scanning for the end-of-contents marker. Children
/// are only parsed when a container is entered, and every level of entering
/// counts against `max_depth`.
#[derive(Debug, Clone)]
pub(crate) struct DerReader<'a> {
    input: &'a [u8],
    depth: usize,
    max_depth: usize,
}

impl<'a> DerReader<'a> {
    pub(crate) fn new(input: &'a [u8], max_depth: usize) -> Self {
        Self {
            input,
            depth: 0,
            max_depth,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub(crate) fn read_element(&mut self) -> Result<DerElement<'a>, EncodingError> {
        if self.depth > self.max_depth {
            return Err(EncodingError::DepthExceeded(self.max_depth));
        }
        let (element, rest) = parse_element(self.input, self.depth, self.max_depth)?;
        self.input = rest;
        Ok(element)
    }

    /// Reads the next element, failing with `MissingElement(what)` at the end
    /// of input.
    pub(crate) fn expect_element(
        &mut self,
        what: &'static str,
    ) -> Result<DerElement<'a>, EncodingError> {
        if self.is_empty() {
            return Err(EncodingError::MissingElement(what));
        }
        self.read_element()
    }

    /// Reads the next element only if its identifier octet is `tag`.
    pub(crate) fn read_optional(&mut self, tag: u8) -> Result<Option<DerElement<'a>>, EncodingError> {
        match self.input.first() {
            Some(&next) if next == tag => self.read_element().map(Some),
            _ => Ok(None),
        }
    }

    /// Reads exactly one element and requires the input to end there.
    pub(crate) fn single(mut self) -> Result<DerElement<'a>, EncodingError> {
        let element = self.expect_element("element")?;
        if !self.input.is_empty() {
            return Err(EncodingError::TrailingBytes(self.input.len()));
        }
        Ok(element)
    }
}

impl<'a> Iterator for DerReader<'a> {
    type Item = Result<DerElement<'a>, EncodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.input.is_empty() {
            return None;
        }
        let result = self.read_element();
        if result.is_err() {
            // Nothing after a broken header can be trusted.
            self.input = &[];
        }
        Some(result)
    }
}

/// A single decoded element: borrowed views of its payload and of the whole
/// encoding, plus the depth it was found at.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DerElement<'a> {
    tag: u8,
    value: &'a [u8],
    raw: &'a [u8],
    depth: usize,
    max_depth: usize,
}

impl<'a> DerElement<'a> {
    pub(crate) fn tag(&self) -> u8 {
        self.tag
    }

    pub(crate) fn kind(&self) -> ElementKind {
        ElementKind::of(self.tag)
    }

    pub(crate) fn is_constructed(&self) -> bool {
        self.tag & CONSTRUCTED != 0
    }

    pub(crate) fn value(&self) -> &'a [u8] {
        self.value
    }

    /// The complete encoding of the element, header included.
    pub(crate) fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn expect_tag(self, tag: u8, expected: &'static str) -> Result<Self, EncodingError> {
        if self.tag != tag {
            return Err(EncodingError::UnexpectedTag {
                expected,
                found: self.tag,
            });
        }
        Ok(self)
    }

    /// Reader over the children of a constructed element.
    pub(crate) fn children(&self) -> Result<DerReader<'a>, EncodingError> {
        if !self.is_constructed() {
            return Err(EncodingError::UnexpectedTag {
                expected: "constructed element",
                found: self.tag,
            });
        }
        Ok(self.nested(self.value))
    }

    /// Decodes the payload of a primitive OCTET STRING as exactly one nested
    /// element, one level deeper than this one.
    pub(crate) fn encapsulated(&self) -> Result<DerElement<'a>, EncodingError> {
        let element = self.expect_tag(TAG_OCTET_STRING, "octet string")?;
        element.nested(element.value).single()
    }

    pub(crate) fn as_integer(&self) -> Result<i64, EncodingError> {
        self.expect_tag(TAG_INTEGER, "integer")?;
        let (&first, _) = self
            .value
            .split_first()
            .ok_or(EncodingError::InvalidInteger)?;
        if self.value.len() > 8 {
            return Err(EncodingError::IntegerOverflow);
        }
        let seed: i64 = if first & 0x80 != 0 { -1 } else { 0 };
        Ok(self
            .value
            .iter()
            .fold(seed, |acc, byte| (acc << 8) | i64::from(*byte)))
    }

    pub(crate) fn as_utf8_str(&self) -> Result<&'a str, EncodingError> {
        self.expect_tag(TAG_UTF8_STRING, "UTF-8 string")?;
        std::str::from_utf8(self.value).map_err(|_| EncodingError::InvalidString("UTF-8"))
    }

    pub(crate) fn as_ia5_str(&self) -> Result<&'a str, EncodingError> {
        self.expect_tag(TAG_IA5_STRING, "IA5 string")?;
        if !self.value.is_ascii() {
            return Err(EncodingError::InvalidString("IA5"));
        }
        std::str::from_utf8(self.value).map_err(|_| EncodingError::InvalidString("IA5"))
    }

    pub(crate) fn as_oid(&self) -> Result<&'a [u8], EncodingError> {
        self.expect_tag(TAG_OID, "object identifier")?;
        Ok(self.value)
    }

    /// Contents of an OCTET STRING. Segmented encodings are reassembled,
    /// everything else is borrowed.
    pub(crate) fn octets(&self) -> Result<Cow<'a, [u8]>, EncodingError> {
        if self.kind() != ElementKind::OctetString {
            return Err(EncodingError::UnexpectedTag {
                expected: "octet string",
                found: self.tag,
            });
        }
        if !self.is_constructed() {
            return Ok(Cow::Borrowed(self.value));
        }
        let mut joined = Vec::with_capacity(self.value.len());
        for segment in self.children()? {
            joined.extend_from_slice(&segment?.octets()?);
        }
        Ok(Cow::Owned(joined))
    }

    fn nested(&self, input: &'a [u8]) -> DerReader<'a> {
        DerReader {
            input,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        }
    }
}

fn parse_element(
    input: &[u8],
    depth: usize,
    max_depth: usize,
) -> Result<(DerElement<'_>, &[u8]), EncodingError> {
    let (&tag, after_tag) = input.split_first().ok_or(EncodingError::TruncatedHeader)?;
    if tag & HIGH_TAG_NUMBER == HIGH_TAG_NUMBER {
        return Err(EncodingError::UnsupportedTag);
    }
    let (&first, after_first) = after_tag
        .split_first()
        .ok_or(EncodingError::TruncatedHeader)?;

    if first == LENGTH_INDEFINITE {
        if tag & CONSTRUCTED == 0 {
            return Err(EncodingError::UnsupportedLength);
        }
        let len = indefinite_content_len(after_first, depth + 1, max_depth)?;
        // Header, contents and the two end-of-contents octets.
        let total = 2 + len + 2;
        let element = DerElement {
            tag,
            value: &after_first[..len],
            raw: &input[..total],
            depth,
            max_depth,
        };
        return Ok((element, &input[total..]));
    }

    let (len, header_len) = if first < 0x80 {
        (usize::from(first), 2)
    } else {
        let count = usize::from(first & 0x7F);
        if count > MAX_LENGTH_OCTETS {
            return Err(EncodingError::UnsupportedLength);
        }
        let octets = after_first
            .get(..count)
            .ok_or(EncodingError::TruncatedHeader)?;
        let len = octets
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
        (len, 2 + count)
    };

    let remaining = input.len() - header_len;
    if len > remaining {
        return Err(EncodingError::LengthExceedsInput {
            declared: len,
            remaining,
        });
    }
    let total = header_len + len;
    let element = DerElement {
        tag,
        value: &input[header_len..total],
        raw: &input[..total],
        depth,
        max_depth,
    };
    Ok((element, &input[total..]))
}

/// Length of indefinite-length contents, excluding the end-of-contents
/// marker. `depth` is the depth of the children being skipped.
fn indefinite_content_len(
    body: &[u8],
    depth: usize,
    max_depth: usize,
) -> Result<usize, EncodingError> {
    if depth > max_depth {
        return Err(EncodingError::DepthExceeded(max_depth));
    }
    let mut offset = 0;
    loop {
        match body.get(offset..offset + 2) {
            None => return Err(EncodingError::UnterminatedContent),
            Some([0, 0]) => return Ok(offset),
            Some(_) => {
                let (child, _) = parse_element(&body[offset..], depth, max_depth)?;
                offset += child.raw.len();
            }
        }
    }
}
