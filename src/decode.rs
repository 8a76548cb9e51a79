use super::error::{BencodeError, Result};
use super::value::Value;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Default limit on nested lists and dictionaries.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What to do when a dictionary repeats a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// Keep the value of the last occurrence.
    #[default]
    LastWins,
    /// Fail with [`BencodeError::DuplicateKey`].
    Reject,
}

/// What to do with bytes left over after the top-level element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingData {
    /// Parse the first element and drop the rest.
    #[default]
    Ignore,
    /// Fail with [`BencodeError::TrailingData`].
    Reject,
}

/// Decoder configuration.
///
/// The defaults accept everything the permissive legacy decoders accept,
/// while still bounding nesting depth.
///
/// ```
/// use canonical_bencode::{DecodeOptions, Decoder, DuplicateKeys, TrailingData};
///
/// let strict = DecodeOptions::default()
///     .with_max_depth(16)
///     .with_duplicate_keys(DuplicateKeys::Reject)
///     .with_trailing_data(TrailingData::Reject);
///
/// assert!(Decoder::new(strict).decode(b"i1eextra").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest allowed nesting of lists and dictionaries.
    pub max_depth: usize,
    pub duplicate_keys: DuplicateKeys,
    pub trailing_data: TrailingData,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            duplicate_keys: DuplicateKeys::default(),
            trailing_data: TrailingData::default(),
        }
    }
}

impl DecodeOptions {
    /// Sets the nesting limit; exceeding it fails with
    /// [`BencodeError::NestingTooDeep`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the policy for repeated dictionary keys.
    pub fn with_duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Sets the policy for bytes after the top-level element.
    pub fn with_trailing_data(mut self, policy: TrailingData) -> Self {
        self.trailing_data = policy;
        self
    }
}

/// Recursive-descent bencode parser.
///
/// Every parsing step returns the parsed value together with the input that
/// remains after it, so lists and dictionaries are parsed by repeatedly
/// parsing elements from the remainder until the closing `e`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decoder {
    options: DecodeOptions,
}

impl Decoder {
    /// Creates a decoder with the given options.
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// The options this decoder was built with.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Parses `data` into a [`Value`] tree.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed element; no partial tree is returned.
    pub fn decode(&self, data: &[u8]) -> Result<Value> {
        if data.is_empty() {
            return Err(BencodeError::EmptyInput);
        }

        let (value, rest) = self.parse_element(data, 0)?;

        if !rest.is_empty() && self.options.trailing_data == TrailingData::Reject {
            return Err(BencodeError::TrailingData(rest.len()));
        }

        Ok(value)
    }

    fn parse_element<'a>(&self, data: &'a [u8], depth: usize) -> Result<(Value, &'a [u8])> {
        let Some(&first) = data.first() else {
            return Err(BencodeError::UnexpectedEof);
        };

        match first {
            b'i' => parse_integer(data),
            b'l' => self.parse_list(data, depth),
            b'd' => self.parse_dict(data, depth),
            b'0'..=b'9' => {
                let (bytes, rest) = parse_string(data)?;
                Ok((Value::Bytes(bytes), rest))
            }
            c => Err(BencodeError::InvalidFormat(c as char)),
        }
    }

    fn enter(&self, depth: usize) -> Result<usize> {
        let depth = depth + 1;
        if depth > self.options.max_depth {
            tracing::debug!("Rejecting input nested deeper than {}", self.options.max_depth);
            return Err(BencodeError::NestingTooDeep(self.options.max_depth));
        }
        Ok(depth)
    }

    fn parse_list<'a>(&self, data: &'a [u8], depth: usize) -> Result<(Value, &'a [u8])> {
        let depth = self.enter(depth)?;
        let mut rest = &data[1..];
        let mut list = Vec::new();

        while let Some(&next) = rest.first() {
            if next == b'e' {
                return Ok((Value::List(list), &rest[1..]));
            }
            let (item, remaining) = self.parse_element(rest, depth)?;
            list.push(item);
            rest = remaining;
        }

        Err(BencodeError::UnexpectedEof)
    }

    fn parse_dict<'a>(&self, data: &'a [u8], depth: usize) -> Result<(Value, &'a [u8])> {
        let depth = self.enter(depth)?;
        let mut rest = &data[1..];
        let mut dict = BTreeMap::new();

        while let Some(&next) = rest.first() {
            if next == b'e' {
                return Ok((Value::Dict(dict), &rest[1..]));
            }
            if !next.is_ascii_digit() {
                return Err(BencodeError::InvalidStringFormat);
            }

            let (key, remaining) = parse_string(rest)?;
            let (value, remaining) = self.parse_element(remaining, depth)?;
            rest = remaining;

            match dict.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(mut slot) => {
                    let key = String::from_utf8_lossy(slot.key()).into_owned();
                    if self.options.duplicate_keys == DuplicateKeys::Reject {
                        return Err(BencodeError::DuplicateKey(key));
                    }
                    tracing::trace!("Duplicate dictionary key {:?}, keeping last value", key);
                    slot.insert(value);
                }
            }
        }

        Err(BencodeError::UnexpectedEof)
    }
}

/// Parses `i<digits>e`. The body is everything up to the first `e`.
fn parse_integer(data: &[u8]) -> Result<(Value, &[u8])> {
    let end = data
        .iter()
        .position(|&b| b == b'e')
        .ok_or(BencodeError::InvalidInteger)?;

    let body = String::from_utf8_lossy(&data[1..end]);
    let value: i64 = body.parse().map_err(|source| BencodeError::IntegerSyntax {
        body: body.to_string(),
        source,
    })?;

    Ok((Value::Integer(value), &data[end + 1..]))
}

/// Parses `<length>:<bytes>`.
fn parse_string(data: &[u8]) -> Result<(Bytes, &[u8])> {
    let colon = data
        .iter()
        .position(|&b| b == b':')
        .ok_or(BencodeError::InvalidStringFormat)?;

    let prefix = String::from_utf8_lossy(&data[..colon]);
    let len: usize = prefix
        .parse()
        .map_err(|_| BencodeError::InvalidStringLength(prefix.to_string()))?;

    let body = &data[colon + 1..];
    if len > body.len() {
        return Err(BencodeError::TruncatedString {
            declared: len,
            available: body.len(),
        });
    }

    Ok((Bytes::copy_from_slice(&body[..len]), &body[len..]))
}

/// Decodes bencode bytes into a [`Value`] using the default options.
///
/// # Examples
///
/// ```
/// use canonical_bencode::{decode, Value};
///
/// assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
/// assert_eq!(decode(b"4:spam").unwrap().as_str(), Some("spam"));
///
/// let value = decode(b"d3:foo3:bare").unwrap();
/// assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
/// ```
pub fn decode(data: &[u8]) -> Result<Value> {
    Decoder::default().decode(data)
}

/// Decodes bencode bytes into a [`Value`] with explicit options.
pub fn decode_with(data: &[u8], options: DecodeOptions) -> Result<Value> {
    Decoder::new(options).decode(data)
}
