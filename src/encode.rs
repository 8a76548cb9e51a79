use super::error::{BencodeError, Result};
use super::value::Value;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::BuildHasher;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

/// What to do when a list element, record field or map entry fails to encode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElementErrors {
    /// Abort the whole encoding with the element's error.
    #[default]
    Propagate,
    /// Leave the element out of the output and keep going.
    Skip,
}

/// Encoder configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    pub on_error: ElementErrors,
}

impl EncodeOptions {
    /// Sets how failing list elements, record fields and map entries are
    /// handled.
    pub fn with_element_errors(mut self, policy: ElementErrors) -> Self {
        self.on_error = policy;
        self
    }

    /// Shorthand for `with_element_errors(ElementErrors::Skip)`.
    pub fn skip_invalid(self) -> Self {
        self.with_element_errors(ElementErrors::Skip)
    }
}

/// A type that can be written as bencode.
///
/// Implementations exist for integers of every width, strings and
/// [`Bytes`], sequences, string-keyed maps, optional and boxed values,
/// [`Value`], and any struct registered with [`record!`](crate::record).
///
/// The trait is object safe, so `Box<dyn Encode>` can stand in for a
/// dynamically typed value.
pub trait Encode {
    /// Writes this value's bencode form through `encoder`.
    fn encode(&self, encoder: &mut Encoder) -> Result<()>;

    /// Returns true when there is nothing to write, as for `None`.
    ///
    /// Dictionary entries whose value is absent are left out entirely.
    fn is_absent(&self) -> bool {
        false
    }
}

/// A type usable as a dictionary key when encoding.
pub trait AsKey {
    /// The raw key bytes, which also decide the key's sort position.
    fn key_bytes(&self) -> &[u8];
}

impl AsKey for str {
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsKey for String {
    fn key_bytes(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsKey for Bytes {
    fn key_bytes(&self) -> &[u8] {
        self
    }
}

impl<K: AsKey + ?Sized> AsKey for &K {
    fn key_bytes(&self) -> &[u8] {
        (**self).key_bytes()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Primitive integer types accepted by [`Encoder::emit_integer`].
///
/// Sealed, so only decimal integer text can ever land between `i` and `e`.
pub trait Integer: std::fmt::Display + Copy + sealed::Sealed {}

/// Writes canonical bencode into an in-memory buffer.
///
/// Values are streamed straight from their Rust representation; no
/// intermediate [`Value`] tree is built.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
    options: EncodeOptions,
}

impl Encoder {
    /// Creates an empty encoder with the given options.
    pub fn new(options: EncodeOptions) -> Self {
        Self {
            buf: Vec::new(),
            options,
        }
    }

    /// The options this encoder was built with.
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the encoder and returns everything it wrote.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Encodes `value` at the current position.
    pub fn emit<T: Encode + ?Sized>(&mut self, value: &T) -> Result<()> {
        value.encode(self)
    }

    /// Writes `i<value>e`.
    ///
    /// Only primitive integers are accepted:
    ///
    /// ```compile_fail
    /// use canonical_bencode::{EncodeOptions, Encoder};
    ///
    /// let mut encoder = Encoder::new(EncodeOptions::default());
    /// encoder.emit_integer(1.5f64).unwrap();
    /// ```
    pub fn emit_integer<T: Integer>(&mut self, value: T) -> Result<()> {
        write!(self.buf, "i{}e", value)?;
        Ok(())
    }

    /// Writes `<len>:<bytes>`, the length counted in bytes.
    pub fn emit_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        write!(self.buf, "{}:", bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes a list of the given items in order.
    pub fn emit_list<'a, I, T>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a T>,
        T: Encode + ?Sized + 'a,
    {
        self.buf.push(b'l');
        for item in items {
            self.emit_element(|encoder| item.encode(encoder))?;
        }
        self.buf.push(b'e');
        Ok(())
    }

    /// Writes a dictionary with its keys in lexicographic byte order.
    ///
    /// Entries with an absent value are omitted first. If the same key then
    /// appears more than once, the last entry wins.
    pub fn emit_dict<'k, 'v, I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'k K, &'v V)>,
        K: AsKey + ?Sized + 'k,
        V: Encode + ?Sized + 'v,
    {
        let mut entries: Vec<(&[u8], &V)> = entries
            .into_iter()
            .filter(|(_, value)| !value.is_absent())
            .map(|(key, value)| (key.key_bytes(), value))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        self.buf.push(b'd');
        for (i, &(key, value)) in entries.iter().enumerate() {
            let shadowed = entries.get(i + 1).is_some_and(|next| next.0 == key);
            if shadowed {
                continue;
            }
            self.emit_element(|encoder| {
                encoder.emit_bytes(key)?;
                value.encode(encoder)
            })?;
        }
        self.buf.push(b'e');
        Ok(())
    }

    /// Runs `f`, applying the element error policy if it fails.
    ///
    /// On a skipped failure, whatever `f` wrote is rolled back.
    fn emit_element<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mark = self.buf.len();
        match f(self) {
            Ok(()) => Ok(()),
            Err(err) if self.options.on_error == ElementErrors::Skip => {
                tracing::debug!("Skipping element that failed to encode: {}", err);
                self.buf.truncate(mark);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

macro_rules! impl_encode_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Integer for $ty {}

            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) -> Result<()> {
                    encoder.emit_integer(*self)
                }
            }
        )*
    };
}

impl_encode_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! impl_encode_unsupported {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, _encoder: &mut Encoder) -> Result<()> {
                    Err(BencodeError::UnsupportedType($name))
                }
            }
        )*
    };
}

impl_encode_unsupported!(
    f32 => "f32",
    f64 => "f64",
    bool => "bool",
    char => "char",
    () => "()",
);

impl Encode for str {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_bytes(self.as_bytes())
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_bytes(self.as_bytes())
    }
}

impl Encode for Bytes {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_bytes(self)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_list(self.iter())
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_list(self.iter())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_list(self.iter())
    }
}

impl<T: Encode> Encode for VecDeque<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_list(self.iter())
    }
}

impl<K: AsKey, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_dict(self.iter())
    }
}

impl<K: AsKey, V: Encode, S: BuildHasher> Encode for HashMap<K, V, S> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        encoder.emit_dict(self.iter())
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        match self {
            Some(value) => value.encode(encoder),
            None => Ok(()),
        }
    }

    fn is_absent(&self) -> bool {
        match self {
            Some(value) => value.is_absent(),
            None => true,
        }
    }
}

macro_rules! impl_encode_pointer {
    ($($ptr:ident),* $(,)?) => {
        $(
            impl<T: Encode + ?Sized> Encode for $ptr<T> {
                fn encode(&self, encoder: &mut Encoder) -> Result<()> {
                    (**self).encode(encoder)
                }

                fn is_absent(&self) -> bool {
                    (**self).is_absent()
                }
            }
        )*
    };
}

impl_encode_pointer!(Box, Rc, Arc);

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        (**self).encode(encoder)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl Encode for Value {
    fn encode(&self, encoder: &mut Encoder) -> Result<()> {
        match self {
            Value::Integer(i) => encoder.emit_integer(*i),
            Value::Bytes(b) => encoder.emit_bytes(b),
            Value::List(l) => encoder.emit_list(l.iter()),
            Value::Dict(d) => encoder.emit_dict(d.iter()),
        }
    }
}

/// Encodes a value to canonical bencode using the default options.
///
/// A failing list element, record field or map entry aborts the encoding;
/// use [`encode_with`] and [`EncodeOptions::skip_invalid`] to leave such
/// elements out instead.
///
/// # Examples
///
/// ```
/// use canonical_bencode::encode;
/// use std::collections::HashMap;
///
/// assert_eq!(encode(&-65535).unwrap(), b"i-65535e");
/// assert_eq!(encode("spam").unwrap(), b"4:spam");
/// assert_eq!(encode(&vec!["hello", "world"]).unwrap(), b"l5:hello5:worlde");
///
/// let mut dict = HashMap::new();
/// dict.insert("t2", 2);
/// dict.insert("t1", 1);
/// assert_eq!(encode(&dict).unwrap(), b"d2:t1i1e2:t2i2ee");
/// ```
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>> {
    encode_with(value, EncodeOptions::default())
}

/// Encodes a value to canonical bencode with explicit options.
pub fn encode_with<T: Encode + ?Sized>(value: &T, options: EncodeOptions) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new(options);
    encoder.emit(value)?;
    Ok(encoder.into_bytes())
}

/// Encodes a value and writes the bytes to `writer` using the default
/// options.
///
/// The value is encoded into memory first and then written in one call, so
/// nothing reaches `writer` if encoding fails.
pub fn encode_to<T, W>(value: &T, writer: &mut W) -> Result<()>
where
    T: Encode + ?Sized,
    W: Write,
{
    encode_to_with(value, writer, EncodeOptions::default())
}

/// Like [`encode_to`], with explicit options.
///
/// ```
/// use canonical_bencode::{encode_to_with, Encode, EncodeOptions};
///
/// let items: Vec<Box<dyn Encode>> = vec![Box::new(1), Box::new(0.5), Box::new("x")];
/// let mut out = Vec::new();
/// encode_to_with(&items, &mut out, EncodeOptions::default().skip_invalid()).unwrap();
/// assert_eq!(out, b"li1e1:xe");
/// ```
pub fn encode_to_with<T, W>(value: &T, writer: &mut W, options: EncodeOptions) -> Result<()>
where
    T: Encode + ?Sized,
    W: Write,
{
    let bytes = encode_with(value, options)?;
    writer.write_all(&bytes)?;
    Ok(())
}
