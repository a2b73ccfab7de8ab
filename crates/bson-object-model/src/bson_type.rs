//! The kind discriminant of a BSON value and its wire tags.

use std::fmt;

use crate::error::BsonError;

/// The kind of a [`BsonValue`](crate::BsonValue).
///
/// Discriminants are the element type bytes of the BSON wire format.
/// `EndOfDocument` is not a value kind; readers return it when a document
/// or array has no more elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BsonType {
    EndOfDocument = 0x00,
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Undefined = 0x06,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0a,
    RegularExpression = 0x0b,
    JavaScript = 0x0d,
    Symbol = 0x0e,
    JavaScriptWithScope = 0x0f,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    MaxKey = 0x7f,
    MinKey = 0xff,
}

impl BsonType {
    /// Element type byte used on the wire.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Position of this kind in the cross-kind sort order.
    ///
    /// Kinds that share a rank (numbers; string and symbol; date-time and
    /// timestamp) are compared by payload instead.
    pub fn sort_rank(self) -> u8 {
        match self {
            BsonType::EndOfDocument => 0,
            BsonType::MinKey => 1,
            BsonType::Undefined => 2,
            BsonType::Null => 3,
            BsonType::Double | BsonType::Int32 | BsonType::Int64 => 4,
            BsonType::String | BsonType::Symbol => 5,
            BsonType::Document => 6,
            BsonType::Array => 7,
            BsonType::Binary => 8,
            BsonType::ObjectId => 9,
            BsonType::Boolean => 10,
            BsonType::DateTime | BsonType::Timestamp => 11,
            BsonType::RegularExpression => 12,
            BsonType::JavaScript => 13,
            BsonType::JavaScriptWithScope => 14,
            BsonType::MaxKey => 15,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, BsonType::Double | BsonType::Int32 | BsonType::Int64)
    }

    pub fn name(self) -> &'static str {
        match self {
            BsonType::EndOfDocument => "EndOfDocument",
            BsonType::Double => "Double",
            BsonType::String => "String",
            BsonType::Document => "Document",
            BsonType::Array => "Array",
            BsonType::Binary => "Binary",
            BsonType::Undefined => "Undefined",
            BsonType::ObjectId => "ObjectId",
            BsonType::Boolean => "Boolean",
            BsonType::DateTime => "DateTime",
            BsonType::Null => "Null",
            BsonType::RegularExpression => "RegularExpression",
            BsonType::JavaScript => "JavaScript",
            BsonType::Symbol => "Symbol",
            BsonType::JavaScriptWithScope => "JavaScriptWithScope",
            BsonType::Int32 => "Int32",
            BsonType::Timestamp => "Timestamp",
            BsonType::Int64 => "Int64",
            BsonType::MaxKey => "MaxKey",
            BsonType::MinKey => "MinKey",
        }
    }
}

impl fmt::Display for BsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for BsonType {
    type Error = BsonError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Ok(match tag {
            0x00 => BsonType::EndOfDocument,
            0x01 => BsonType::Double,
            0x02 => BsonType::String,
            0x03 => BsonType::Document,
            0x04 => BsonType::Array,
            0x05 => BsonType::Binary,
            0x06 => BsonType::Undefined,
            0x07 => BsonType::ObjectId,
            0x08 => BsonType::Boolean,
            0x09 => BsonType::DateTime,
            0x0a => BsonType::Null,
            0x0b => BsonType::RegularExpression,
            0x0d => BsonType::JavaScript,
            0x0e => BsonType::Symbol,
            0x0f => BsonType::JavaScriptWithScope,
            0x10 => BsonType::Int32,
            0x11 => BsonType::Timestamp,
            0x12 => BsonType::Int64,
            0x7f => BsonType::MaxKey,
            0xff => BsonType::MinKey,
            t => return Err(BsonError::UnsupportedType(t)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for t in [
            BsonType::Double,
            BsonType::String,
            BsonType::JavaScriptWithScope,
            BsonType::MaxKey,
            BsonType::MinKey,
        ] {
            assert_eq!(BsonType::try_from(t.tag()).unwrap(), t);
        }
    }

    #[test]
    fn deprecated_and_unknown_tags_are_rejected() {
        assert_eq!(BsonType::try_from(0x0c), Err(BsonError::UnsupportedType(0x0c)));
        assert_eq!(BsonType::try_from(0x13), Err(BsonError::UnsupportedType(0x13)));
    }

    #[test]
    fn shared_ranks() {
        assert_eq!(BsonType::Int32.sort_rank(), BsonType::Double.sort_rank());
        assert_eq!(BsonType::String.sort_rank(), BsonType::Symbol.sort_rank());
        assert_eq!(BsonType::DateTime.sort_rank(), BsonType::Timestamp.sort_rank());
        assert!(BsonType::MinKey.sort_rank() < BsonType::Null.sort_rank());
        assert!(BsonType::JavaScriptWithScope.sort_rank() < BsonType::MaxKey.sort_rank());
    }
}
