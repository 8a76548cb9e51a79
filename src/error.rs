use std::num::ParseIntError;

use thiserror::Error;

/// Errors produced while decoding, encoding or binding bencode.
///
/// Variants fall into two groups: input errors raised by the decoder when the
/// bytes are not well-formed (see [`BencodeError::is_input_error`]) and type
/// errors raised when a Rust value and a bencode shape do not fit together
/// (see [`BencodeError::is_type_error`]).
#[derive(Debug, Error)]
pub enum BencodeError {
    /// There were no bytes to decode.
    #[error("empty input")]
    EmptyInput,

    /// An integer was opened with `i` but never closed with `e`.
    #[error("invalid integer: missing terminating 'e'")]
    InvalidInteger,

    /// The body of an integer is not a base-10 `i64`.
    #[error("invalid integer {body:?}: {source}")]
    IntegerSyntax {
        body: String,
        #[source]
        source: ParseIntError,
    },

    /// A byte string length prefix is not followed by `:`.
    #[error("invalid string format: missing ':' after length")]
    InvalidStringFormat,

    /// A byte string length prefix is not a non-negative decimal number.
    #[error("invalid string length: {0:?}")]
    InvalidStringLength(String),

    /// A byte string declares more bytes than remain in the input.
    #[error("string length exceeds data: declared {declared}, {available} available")]
    TruncatedString { declared: usize, available: usize },

    /// An element starts with a byte that is not `i`, `l`, `d` or a digit.
    #[error("invalid format: unexpected character {0:?}")]
    InvalidFormat(char),

    /// A list or dictionary ran off the end of the input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Containers are nested deeper than the configured limit.
    #[error("nesting too deep: limit is {0}")]
    NestingTooDeep(usize),

    /// A dictionary repeats a key and duplicates are rejected.
    #[error("duplicate dictionary key: {0:?}")]
    DuplicateKey(String),

    /// Bytes follow the top-level element and trailing data is rejected.
    #[error("trailing data after value: {0} bytes")]
    TrailingData(usize),

    /// The value has no bencode representation.
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    /// The decoded shape does not fit the destination.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A decoded scalar cannot be converted to the destination type.
    #[error("cannot convert {value} to {target}")]
    Conversion { value: String, target: &'static str },

    /// No destination was supplied to decode into.
    #[error("destination must be a non-null mutable reference")]
    InvalidDestination,

    /// Writing encoded output to a sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BencodeError {
    /// Returns true for errors caused by malformed input bytes.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BencodeError::EmptyInput
                | BencodeError::InvalidInteger
                | BencodeError::IntegerSyntax { .. }
                | BencodeError::InvalidStringFormat
                | BencodeError::InvalidStringLength(_)
                | BencodeError::TruncatedString { .. }
                | BencodeError::InvalidFormat(_)
                | BencodeError::UnexpectedEof
                | BencodeError::NestingTooDeep(_)
                | BencodeError::DuplicateKey(_)
                | BencodeError::TrailingData(_)
        )
    }

    /// Returns true for errors caused by a mismatch between Rust types and
    /// bencode shapes.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            BencodeError::UnsupportedType(_)
                | BencodeError::TypeMismatch { .. }
                | BencodeError::Conversion { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BencodeError>;
