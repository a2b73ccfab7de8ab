//! Byte-order conversion of 128-bit GUIDs across driver conventions.
//!
//! Older drivers stored GUIDs as binary subtype 3 in whatever byte order
//! their platform used. Reading those bytes back correctly requires
//! knowing which convention wrote them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BsonError;

/// Byte layout used to store a GUID in a binary value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuidRepresentation {
    /// No convention chosen. Converting under it is an error.
    Unspecified,
    /// RFC 4122 network byte order (binary subtype 4).
    Standard,
    /// .NET `Guid.ToByteArray` order: the first three fields little-endian.
    CSharpLegacy,
    /// Standard order with each 8-byte half reversed in place. The halves are
    /// not swapped, which is the layout the legacy Java driver actually stores.
    JavaLegacy,
    /// Standard order, stored under the legacy subtype 3.
    PythonLegacy,
}

/// Converts between [`Uuid`] values and their stored bytes.
pub struct GuidConverter;

impl GuidConverter {
    /// Encodes `guid` in the byte order of `representation`.
    pub fn to_bytes(guid: Uuid, representation: GuidRepresentation) -> Result<[u8; 16], BsonError> {
        match representation {
            GuidRepresentation::Unspecified => Err(BsonError::UnspecifiedGuidRepresentation),
            GuidRepresentation::Standard | GuidRepresentation::PythonLegacy => {
                Ok(*guid.as_bytes())
            }
            GuidRepresentation::CSharpLegacy => Ok(guid.to_bytes_le()),
            GuidRepresentation::JavaLegacy => {
                let mut bytes = *guid.as_bytes();
                reverse_halves(&mut bytes);
                Ok(bytes)
            }
        }
    }

    /// Decodes 16 bytes written under `representation`.
    pub fn from_bytes(bytes: &[u8], representation: GuidRepresentation) -> Result<Uuid, BsonError> {
        let mut bytes: [u8; 16] = bytes
            .try_into()
            .map_err(|_| BsonError::InvalidGuidLength(bytes.len()))?;
        match representation {
            GuidRepresentation::Unspecified => Err(BsonError::UnspecifiedGuidRepresentation),
            GuidRepresentation::Standard | GuidRepresentation::PythonLegacy => {
                Ok(Uuid::from_bytes(bytes))
            }
            GuidRepresentation::CSharpLegacy => Ok(Uuid::from_bytes_le(bytes)),
            GuidRepresentation::JavaLegacy => {
                reverse_halves(&mut bytes);
                Ok(Uuid::from_bytes(bytes))
            }
        }
    }
}

fn reverse_halves(bytes: &mut [u8; 16]) {
    bytes[0..8].reverse();
    bytes[8..16].reverse();
}
