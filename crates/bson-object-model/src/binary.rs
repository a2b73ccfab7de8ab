//! BSON binary data and its subtypes.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::error::BsonError;
use crate::guid::{GuidConverter, GuidRepresentation};

/// Subtype byte of a binary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BsonBinarySubType {
    Binary,
    Function,
    /// Deprecated generic binary with a redundant inner length prefix.
    OldBinary,
    UuidLegacy,
    UuidStandard,
    Md5,
    /// Any other subtype byte, normally in the `0x80..=0xff` range.
    UserDefined(u8),
}

impl BsonBinarySubType {
    pub fn to_u8(self) -> u8 {
        match self {
            BsonBinarySubType::Binary => 0x00,
            BsonBinarySubType::Function => 0x01,
            BsonBinarySubType::OldBinary => 0x02,
            BsonBinarySubType::UuidLegacy => 0x03,
            BsonBinarySubType::UuidStandard => 0x04,
            BsonBinarySubType::Md5 => 0x05,
            BsonBinarySubType::UserDefined(b) => b,
        }
    }

    pub fn is_uuid(self) -> bool {
        matches!(
            self,
            BsonBinarySubType::UuidLegacy | BsonBinarySubType::UuidStandard
        )
    }
}

impl From<u8> for BsonBinarySubType {
    fn from(b: u8) -> Self {
        match b {
            0x00 => BsonBinarySubType::Binary,
            0x01 => BsonBinarySubType::Function,
            0x02 => BsonBinarySubType::OldBinary,
            0x03 => BsonBinarySubType::UuidLegacy,
            0x04 => BsonBinarySubType::UuidStandard,
            0x05 => BsonBinarySubType::Md5,
            b => BsonBinarySubType::UserDefined(b),
        }
    }
}

/// Binary payload with its subtype.
///
/// UUID subtypes also carry the [`GuidRepresentation`] the bytes were
/// written under; it takes part in equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BsonBinaryData {
    bytes: Vec<u8>,
    sub_type: BsonBinarySubType,
    guid_representation: GuidRepresentation,
}

impl BsonBinaryData {
    /// Generic binary (subtype 0).
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            sub_type: BsonBinarySubType::Binary,
            guid_representation: GuidRepresentation::Unspecified,
        }
    }

    /// Binary with an explicit subtype. `UuidStandard` implies the standard
    /// representation; every other subtype is left unspecified.
    pub fn with_sub_type(
        bytes: impl Into<Vec<u8>>,
        sub_type: BsonBinarySubType,
    ) -> Result<Self, BsonError> {
        let representation = if sub_type == BsonBinarySubType::UuidStandard {
            GuidRepresentation::Standard
        } else {
            GuidRepresentation::Unspecified
        };
        Self::with_guid_representation(bytes, sub_type, representation)
    }

    pub fn with_guid_representation(
        bytes: impl Into<Vec<u8>>,
        sub_type: BsonBinarySubType,
        guid_representation: GuidRepresentation,
    ) -> Result<Self, BsonError> {
        let bytes = bytes.into();
        match sub_type {
            BsonBinarySubType::UuidStandard | BsonBinarySubType::UuidLegacy => {
                if bytes.len() != 16 {
                    return Err(BsonError::InvalidGuidLength(bytes.len()));
                }
                let standard = guid_representation == GuidRepresentation::Standard;
                if (sub_type == BsonBinarySubType::UuidStandard) != standard
                    && guid_representation != GuidRepresentation::Unspecified
                {
                    return Err(BsonError::format(format!(
                        "subtype {sub_type:?} cannot use GUID representation {guid_representation:?}"
                    )));
                }
            }
            _ => {
                if guid_representation != GuidRepresentation::Unspecified {
                    return Err(BsonError::format(format!(
                        "subtype {sub_type:?} cannot carry a GUID representation"
                    )));
                }
            }
        }
        Ok(Self {
            bytes,
            sub_type,
            guid_representation,
        })
    }

    /// Stores `guid` under the given convention. `Standard` selects subtype 4,
    /// every legacy convention subtype 3.
    pub fn from_guid(guid: Uuid, representation: GuidRepresentation) -> Result<Self, BsonError> {
        let bytes = GuidConverter::to_bytes(guid, representation)?;
        let sub_type = if representation == GuidRepresentation::Standard {
            BsonBinarySubType::UuidStandard
        } else {
            BsonBinarySubType::UuidLegacy
        };
        Ok(Self {
            bytes: bytes.to_vec(),
            sub_type,
            guid_representation: representation,
        })
    }

    /// Decodes the GUID using the stored representation.
    pub fn to_guid(&self) -> Result<Uuid, BsonError> {
        self.to_guid_with(self.guid_representation)
    }

    /// Decodes the GUID assuming the bytes were written under `representation`.
    pub fn to_guid_with(&self, representation: GuidRepresentation) -> Result<Uuid, BsonError> {
        if !self.sub_type.is_uuid() {
            return Err(BsonError::format(format!(
                "binary subtype {:?} does not hold a GUID",
                self.sub_type
            )));
        }
        GuidConverter::from_bytes(&self.bytes, representation)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn sub_type(&self) -> BsonBinarySubType {
        self.sub_type
    }

    pub fn guid_representation(&self) -> GuidRepresentation {
        self.guid_representation
    }

    /// Orders by length, then subtype byte, then bytes.
    pub fn compare_to(&self, other: &Self) -> Ordering {
        self.bytes
            .len()
            .cmp(&other.bytes.len())
            .then_with(|| self.sub_type.to_u8().cmp(&other.sub_type.to_u8()))
            .then_with(|| self.bytes.cmp(&other.bytes))
    }
}
