use super::bind::Bind;
use super::encode::{Encode, Encoder};
use super::error::{BencodeError, Result};
use super::value::Value;

/// Describes how one struct field maps to a dictionary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Declared Rust field name.
    pub name: &'static str,
    /// Dictionary key the field is stored under.
    pub key: &'static str,
    /// Excluded fields are never encoded or bound.
    pub excluded: bool,
}

impl Field {
    /// A field stored under its declared name.
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            key: name,
            excluded: false,
        }
    }

    /// A field stored under an alias.
    pub const fn renamed(name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            key,
            excluded: false,
        }
    }

    /// A field the codec never touches.
    pub const fn excluded(name: &'static str) -> Self {
        Self {
            name,
            key: name,
            excluded: true,
        }
    }
}

/// Returns true when no two included fields share an effective key.
///
/// Evaluated at compile time by [`record!`](crate::record).
pub const fn keys_are_unique(fields: &[Field]) -> bool {
    let mut i = 0;
    while i < fields.len() {
        let mut j = i + 1;
        while j < fields.len() {
            if !fields[i].excluded
                && !fields[j].excluded
                && str_eq(fields[i].key, fields[j].key)
            {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

/// A struct encoded as a dictionary of its fields.
///
/// The field table is fixed per type, so key resolution happens once at
/// compile time rather than on every call. Implement it with the
/// [`record!`](crate::record) macro.
///
/// Effective keys of included fields must be unique; `record!` refuses to
/// register a type that breaks this.
pub trait Record {
    const FIELDS: &'static [Field];

    fn field(&self, name: &str) -> Option<&dyn Encode>;

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Bind>;
}

/// Encodes a record as a dictionary sorted by effective key.
pub fn encode_record<R: Record>(record: &R, encoder: &mut Encoder) -> Result<()> {
    let entries = R::FIELDS
        .iter()
        .filter(|field| !field.excluded)
        .filter_map(|field| record.field(field.name).map(|value| (field.key, value)));
    encoder.emit_dict(entries)
}

/// Binds a decoded dictionary into a record field by field.
///
/// Fields whose key is missing from the dictionary are left untouched and
/// keys with no matching field are ignored.
pub fn bind_record<R: Record>(record: &mut R, value: Value) -> Result<()> {
    let mut entries = match value {
        Value::Dict(entries) => entries,
        other => {
            return Err(BencodeError::TypeMismatch {
                expected: "dictionary",
                found: other.kind(),
            })
        }
    };

    for field in R::FIELDS.iter().filter(|field| !field.excluded) {
        let Some(item) = entries.remove(field.key.as_bytes()) else {
            continue;
        };
        if let Some(slot) = record.field_mut(field.name) {
            slot.bind(item)?;
        }
    }
    Ok(())
}

/// Registers a struct as a bencode [`Record`].
///
/// Each listed field is stored under its declared name, or under the alias
/// given with `=>`. Fields named in the optional `skip { .. }` block are
/// excluded. Fields that are not listed at all are invisible to the codec.
///
/// Two included fields may not share an effective key; registering such a
/// type fails to compile:
///
/// ```compile_fail
/// use canonical_bencode::record;
///
/// #[derive(Default)]
/// struct Clash {
///     a: i64,
///     b: i64,
/// }
///
/// record!(Clash { a => "k", b => "k" });
/// ```
///
/// The macro implements [`Record`](crate::Record),
/// [`Encode`](crate::Encode) and [`Bind`](crate::Bind) for the type.
///
/// # Examples
///
/// ```
/// use canonical_bencode::{decode_as, encode, record};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct FileEntry {
///     name: String,
///     size: u64,
///     checksum: f64,
/// }
///
/// record!(FileEntry {
///     name,
///     size => "length",
/// } skip { checksum });
///
/// let entry = FileEntry { name: "a.txt".into(), size: 3, checksum: 0.5 };
/// let bytes = encode(&entry).unwrap();
/// assert_eq!(bytes, b"d6:lengthi3e4:name5:a.txte");
///
/// let back: FileEntry = decode_as(&bytes).unwrap();
/// assert_eq!(back.name, "a.txt");
/// assert_eq!(back.checksum, 0.0);
/// ```
#[macro_export]
macro_rules! record {
    (
        $ty:ty {
            $($field:ident $(=> $key:literal)?),* $(,)?
        }
        $(skip { $($skipped:ident),* $(,)? })?
    ) => {
        impl $crate::Record for $ty {
            const FIELDS: &'static [$crate::Field] = &[
                $($crate::__record_field!($field $(=> $key)?),)*
                $($($crate::Field::excluded(stringify!($skipped)),)*)?
            ];

            fn field(&self, name: &str) -> ::std::option::Option<&dyn $crate::Encode> {
                match name {
                    $(stringify!($field) => ::std::option::Option::Some(&self.$field),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn field_mut(&mut self, name: &str) -> ::std::option::Option<&mut dyn $crate::Bind> {
                match name {
                    $(stringify!($field) => ::std::option::Option::Some(&mut self.$field),)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        const _: () = ::std::assert!(
            $crate::keys_are_unique(<$ty as $crate::Record>::FIELDS),
            "record fields must have unique bencode keys",
        );

        impl $crate::Encode for $ty {
            fn encode(&self, encoder: &mut $crate::Encoder) -> $crate::Result<()> {
                $crate::encode_record(self, encoder)
            }
        }

        impl $crate::Bind for $ty {
            fn bind(&mut self, value: $crate::Value) -> $crate::Result<()> {
                $crate::bind_record(self, value)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_field {
    ($field:ident) => {
        $crate::Field::named(stringify!($field))
    };
    ($field:ident => $key:literal) => {
        $crate::Field::renamed(stringify!($field), $key)
    };
}
