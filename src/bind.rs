use super::decode::{DecodeOptions, Decoder};
use super::error::{BencodeError, Result};
use super::value::Value;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

/// A destination that a decoded [`Value`] can be assigned into.
///
/// Binding writes into an existing value rather than building a new one, so
/// record fields missing from the input keep whatever they held before.
/// Binding is not transactional: if it fails partway through a nested
/// structure, the destination may be left partially populated.
pub trait Bind {
    fn bind(&mut self, value: Value) -> Result<()>;
}

/// A type usable as a dictionary key when binding.
pub trait FromKey: Sized {
    fn from_key(key: Bytes) -> Result<Self>;
}

impl FromKey for String {
    fn from_key(key: Bytes) -> Result<Self> {
        String::from_utf8(key.to_vec()).map_err(|_| BencodeError::Conversion {
            value: format!("key {:?}", String::from_utf8_lossy(&key)),
            target: "String",
        })
    }
}

impl FromKey for Bytes {
    fn from_key(key: Bytes) -> Result<Self> {
        Ok(key)
    }
}

fn mismatch(expected: &'static str, found: &Value) -> BencodeError {
    BencodeError::TypeMismatch {
        expected,
        found: found.kind(),
    }
}

fn conversion(value: &Value, target: &'static str) -> BencodeError {
    let value = match value {
        Value::Integer(i) => format!("integer {}", i),
        Value::Bytes(b) => format!("byte string {:?}", String::from_utf8_lossy(b)),
        other => other.kind().to_string(),
    };
    BencodeError::Conversion { value, target }
}

macro_rules! impl_bind_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn bind(&mut self, value: Value) -> Result<()> {
                    let converted = match value {
                        Value::Integer(i) => <$ty>::try_from(i).ok(),
                        _ => None,
                    };
                    *self = converted.ok_or_else(|| conversion(&value, stringify!($ty)))?;
                    Ok(())
                }
            }
        )*
    };
}

impl_bind_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! impl_bind_float {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Bind for $ty {
                fn bind(&mut self, value: Value) -> Result<()> {
                    match value {
                        Value::Integer(i) => {
                            *self = i as $ty;
                            Ok(())
                        }
                        other => Err(conversion(&other, stringify!($ty))),
                    }
                }
            }
        )*
    };
}

impl_bind_float!(f32, f64);

impl Bind for String {
    fn bind(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Bytes(bytes) => match std::str::from_utf8(&bytes) {
                Ok(s) => {
                    *self = s.to_owned();
                    Ok(())
                }
                Err(_) => Err(conversion(&Value::Bytes(bytes), "String")),
            },
            other => Err(conversion(&other, "String")),
        }
    }
}

impl Bind for Bytes {
    fn bind(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Bytes(bytes) => {
                *self = bytes;
                Ok(())
            }
            other => Err(conversion(&other, "Bytes")),
        }
    }
}

impl<T: Bind + Default> Bind for Vec<T> {
    fn bind(&mut self, value: Value) -> Result<()> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(mismatch("list", &other)),
        };
        *self = std::iter::repeat_with(T::default).take(items.len()).collect();
        for (slot, item) in self.iter_mut().zip(items) {
            slot.bind(item)?;
        }
        Ok(())
    }
}

impl<T: Bind + Default> Bind for VecDeque<T> {
    fn bind(&mut self, value: Value) -> Result<()> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(mismatch("list", &other)),
        };
        *self = std::iter::repeat_with(T::default).take(items.len()).collect();
        for (slot, item) in self.iter_mut().zip(items) {
            slot.bind(item)?;
        }
        Ok(())
    }
}

impl<T: Bind, const N: usize> Bind for [T; N] {
    fn bind(&mut self, value: Value) -> Result<()> {
        let items = match value {
            Value::List(items) if items.len() == N => items,
            Value::List(_) => {
                return Err(BencodeError::TypeMismatch {
                    expected: "list of matching length",
                    found: "list",
                })
            }
            other => return Err(mismatch("list", &other)),
        };
        for (slot, item) in self.iter_mut().zip(items) {
            slot.bind(item)?;
        }
        Ok(())
    }
}

impl<K, V> Bind for BTreeMap<K, V>
where
    K: FromKey + Ord,
    V: Bind + Default,
{
    fn bind(&mut self, value: Value) -> Result<()> {
        let entries = match value {
            Value::Dict(entries) => entries,
            other => return Err(mismatch("dictionary", &other)),
        };
        for (key, item) in entries {
            let key = K::from_key(key)?;
            let mut elem = V::default();
            elem.bind(item)?;
            self.insert(key, elem);
        }
        Ok(())
    }
}

impl<K, V, S> Bind for HashMap<K, V, S>
where
    K: FromKey + Eq + Hash,
    V: Bind + Default,
    S: BuildHasher,
{
    fn bind(&mut self, value: Value) -> Result<()> {
        let entries = match value {
            Value::Dict(entries) => entries,
            other => return Err(mismatch("dictionary", &other)),
        };
        self.reserve(entries.len());
        for (key, item) in entries {
            let key = K::from_key(key)?;
            let mut elem = V::default();
            elem.bind(item)?;
            self.insert(key, elem);
        }
        Ok(())
    }
}

impl<T: Bind + Default> Bind for Option<T> {
    fn bind(&mut self, value: Value) -> Result<()> {
        self.get_or_insert_with(T::default).bind(value)
    }
}

impl<T: Bind + ?Sized> Bind for Box<T> {
    fn bind(&mut self, value: Value) -> Result<()> {
        (**self).bind(value)
    }
}

/// Stores the decoded tree as is.
impl Bind for Value {
    fn bind(&mut self, value: Value) -> Result<()> {
        *self = value;
        Ok(())
    }
}

/// Assigns an already decoded [`Value`] into `dest`.
pub fn bind<T: Bind + ?Sized>(dest: &mut T, value: Value) -> Result<()> {
    dest.bind(value)
}

/// Decodes `data` and binds the result into `dest`.
///
/// # Errors
///
/// Returns the decoder's error if `data` is malformed, otherwise the
/// binder's error if the decoded shape does not fit `T`.
///
/// # Examples
///
/// ```
/// use canonical_bencode::decode_into;
///
/// let mut words: Vec<String> = Vec::new();
/// decode_into(b"l5:hello5:worlde", &mut words).unwrap();
/// assert_eq!(words, ["hello", "world"]);
/// ```
pub fn decode_into<T: Bind + ?Sized>(data: &[u8], dest: &mut T) -> Result<()> {
    decode_into_with(data, dest, DecodeOptions::default())
}

pub fn decode_into_with<T: Bind + ?Sized>(
    data: &[u8],
    dest: &mut T,
    options: DecodeOptions,
) -> Result<()> {
    let value = Decoder::new(options).decode(data)?;
    dest.bind(value)
}

/// Like [`decode_into`], but for a destination that may be missing.
///
/// Fails with [`BencodeError::InvalidDestination`] before looking at `data`
/// when `dest` is `None`.
pub fn decode_into_opt<T: Bind + ?Sized>(data: &[u8], dest: Option<&mut T>) -> Result<()> {
    let dest = dest.ok_or(BencodeError::InvalidDestination)?;
    decode_into(data, dest)
}

/// Decodes `data` into a fresh `T` built from its default.
///
/// ```
/// use canonical_bencode::decode_as;
/// use std::collections::BTreeMap;
///
/// let dict: BTreeMap<String, i64> = decode_as(b"d1:ai1e1:bi2ee").unwrap();
/// assert_eq!(dict["b"], 2);
/// ```
pub fn decode_as<T: Bind + Default>(data: &[u8]) -> Result<T> {
    let mut dest = T::default();
    decode_into(data, &mut dest)?;
    Ok(dest)
}
