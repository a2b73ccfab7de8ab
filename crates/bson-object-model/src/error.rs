//! Error type shared by the value model and the codecs.

use thiserror::Error;

use crate::bson_type::BsonType;

/// Error type for every fallible BSON object-model operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BsonError {
    #[error("invalid element name {0:?}: names must not contain a NUL byte")]
    InvalidElementName(String),
    #[error("duplicate element name {0:?}")]
    DuplicateElementName(String),
    #[error("element {0:?} not found")]
    ElementNotFound(String),
    #[error("index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cannot cast {from} to {to}")]
    InvalidCast { from: BsonType, to: &'static str },
    #[error("cannot convert {from} to {to}: {reason}")]
    Conversion {
        from: BsonType,
        to: &'static str,
        reason: String,
    },
    #[error("invalid format: {0}")]
    Format(String),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unsupported BSON element type: 0x{0:02x}")]
    UnsupportedType(u8),
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("{method} cannot be called when state is {state}")]
    InvalidState {
        method: &'static str,
        state: &'static str,
    },
    #[error("document size {size} is larger than the maximum of {max}")]
    DocumentTooLarge { size: usize, max: usize },
    #[error("GUID representation is unspecified")]
    UnspecifiedGuidRepresentation,
    #[error("GUID representation {found:?} does not match the configured {expected:?}")]
    GuidRepresentationMismatch {
        expected: crate::guid::GuidRepresentation,
        found: crate::guid::GuidRepresentation,
    },
    #[error("a GUID must be 16 bytes long, got {0}")]
    InvalidGuidLength(usize),
}

impl BsonError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        BsonError::Format(msg.into())
    }

    pub(crate) fn cast(from: BsonType, to: &'static str) -> Self {
        BsonError::InvalidCast { from, to }
    }
}
