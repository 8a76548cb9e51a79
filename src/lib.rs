//! Canonical bencode encoding and decoding.
//!
//! Bencode is the compact binary format BitTorrent uses for `.torrent`
//! metadata and protocol payloads. Because dictionary keys are always written
//! in sorted order, every value has exactly one encoding, which makes the
//! output safe to hash.
//!
//! # Data Types
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! # Overview
//!
//! - [`encode`] walks any [`Encode`] value and writes canonical bytes
//!   directly, without building an intermediate tree.
//! - [`decode`] parses bytes into a [`Value`] tree.
//! - [`decode_into`] decodes and then binds the tree into any [`Bind`]
//!   destination: integers, strings, sequences, string-keyed maps, options,
//!   [`Value`] itself, or a struct registered with [`record!`].
//!
//! # Examples
//!
//! ## Encoding
//!
//! ```
//! use canonical_bencode::{encode, Value};
//! use std::collections::BTreeMap;
//!
//! assert_eq!(encode(&0).unwrap(), b"i0e");
//! assert_eq!(encode("").unwrap(), b"0:");
//!
//! let mut dict = BTreeMap::new();
//! dict.insert("t2", Value::Integer(2));
//! dict.insert("t1", Value::string("v1"));
//! assert_eq!(encode(&dict).unwrap(), b"d2:t12:v12:t2i2ee");
//! ```
//!
//! ## Decoding into typed destinations
//!
//! ```
//! use canonical_bencode::{decode_into, Value};
//!
//! let mut n: i32 = 0;
//! decode_into(b"i1e", &mut n).unwrap();
//! assert_eq!(n, 1);
//!
//! let mut any = Value::Integer(0);
//! decode_into(b"d2:t12:v12:t2i2ee", &mut any).unwrap();
//! assert_eq!(any.get(b"t2"), Some(&Value::Integer(2)));
//! ```
//!
//! ## Records
//!
//! ```
//! use canonical_bencode::{decode_as, encode, record};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Torrent {
//!     announce: String,
//!     piece_length: u32,
//!     created: i64,
//! }
//!
//! record!(Torrent {
//!     announce,
//!     piece_length => "piece length",
//! } skip { created });
//!
//! let torrent = Torrent { announce: "http://t".into(), piece_length: 16384, created: 7 };
//! let bytes = encode(&torrent).unwrap();
//! assert_eq!(bytes, b"d8:announce8:http://t12:piece lengthi16384ee");
//!
//! let decoded: Torrent = decode_as(&bytes).unwrap();
//! assert_eq!(decoded.piece_length, 16384);
//! assert_eq!(decoded.created, 0);
//! ```
//!
//! # Error Handling
//!
//! Input errors come from malformed bytes:
//!
//! - [`BencodeError::EmptyInput`] - Nothing to decode
//! - [`BencodeError::InvalidInteger`] - Integer without a closing `e`
//! - [`BencodeError::IntegerSyntax`] - Integer body is not a base-10 `i64`
//! - [`BencodeError::InvalidStringFormat`] - Length prefix without `:`
//! - [`BencodeError::TruncatedString`] - Declared length exceeds the input
//! - [`BencodeError::InvalidFormat`] - Element starts with an unexpected byte
//! - [`BencodeError::NestingTooDeep`] - Recursion limit exceeded (64 levels by default)
//!
//! Type errors come from values that do not fit:
//!
//! - [`BencodeError::UnsupportedType`] - No bencode form (floats, booleans)
//! - [`BencodeError::TypeMismatch`] - Decoded shape does not fit the destination
//! - [`BencodeError::Conversion`] - Scalar out of range or not convertible

mod bind;
mod decode;
mod encode;
mod error;
mod record;
mod value;

pub use bind::{bind, decode_as, decode_into, decode_into_opt, decode_into_with, Bind, FromKey};
pub use decode::{
    decode, decode_with, DecodeOptions, Decoder, DuplicateKeys, TrailingData, DEFAULT_MAX_DEPTH,
};
pub use encode::{
    encode, encode_to, encode_to_with, encode_with, AsKey, ElementErrors, Encode, EncodeOptions,
    Encoder, Integer,
};
pub use error::{BencodeError, Result};
pub use record::{bind_record, encode_record, keys_are_unique, Field, Record};
pub use value::Value;
