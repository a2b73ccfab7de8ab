//! 12-byte BSON ObjectId and its process-wide generator.
//!
//! Layout (all big-endian): 4-byte seconds since the Unix epoch, 3-byte
//! machine hash, 2-byte process id, 3-byte counter.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::BsonError;

const MAX_24_BITS: u32 = 0x00ff_ffff;

/// BSON ObjectId.
///
/// Fields are declared in wire order so the derived ordering and hash are
/// the byte-for-byte ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId {
    timestamp: u32,
    machine: u32,
    pid: u16,
    increment: u32,
}

// ── Generator state ─────────────────────────────────────────────────────────

struct Generator {
    machine: u32,
    pid: u16,
    counter: AtomicU32,
}

impl Generator {
    fn init() -> Self {
        let machine = machine_hash(&host_name());
        let pid = (std::process::id() & 0xffff) as u16;
        let seed = rand::thread_rng().gen::<u32>() & MAX_24_BITS;
        debug!(machine, pid, "initialized ObjectId generator");
        Self {
            machine,
            pid,
            counter: AtomicU32::new(seed),
        }
    }

    /// Next counter value, masked to 24 bits. Wraps around.
    fn next_increment(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1) & MAX_24_BITS
    }
}

static GENERATOR: Lazy<Generator> = Lazy::new(Generator::init);

fn host_name() -> String {
    for var in ["HOSTNAME", "COMPUTERNAME"] {
        if let Ok(name) = std::env::var(var) {
            if !name.is_empty() {
                return name;
            }
        }
    }
    std::fs::read_to_string("/etc/hostname")
        .map(|s| s.trim().to_owned())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}

fn machine_hash(host: &str) -> u32 {
    let digest = Sha256::digest(host.as_bytes());
    ((digest[0] as u32) << 16) | ((digest[1] as u32) << 8) | (digest[2] as u32)
}

fn now_seconds() -> u32 {
    Utc::now().timestamp() as u32
}

// ── ObjectId ────────────────────────────────────────────────────────────────

impl ObjectId {
    /// Builds an ObjectId from its four components.
    ///
    /// `machine` and `increment` must fit in 24 bits.
    pub fn new(timestamp: u32, machine: u32, pid: u16, increment: u32) -> Result<Self, BsonError> {
        if machine > MAX_24_BITS {
            return Err(BsonError::format(format!(
                "machine value {machine:#x} does not fit in 24 bits"
            )));
        }
        if increment > MAX_24_BITS {
            return Err(BsonError::format(format!(
                "increment value {increment:#x} does not fit in 24 bits"
            )));
        }
        Ok(Self {
            timestamp,
            machine,
            pid,
            increment,
        })
    }

    /// The all-zero ObjectId.
    pub const fn empty() -> Self {
        Self {
            timestamp: 0,
            machine: 0,
            pid: 0,
            increment: 0,
        }
    }

    /// Generates a new ObjectId stamped with the current time.
    pub fn generate_new_id() -> Self {
        Self::generate_new_id_at(now_seconds())
    }

    /// Generates a new ObjectId with the given timestamp.
    ///
    /// The counter is shared by every thread in the process.
    pub fn generate_new_id_at(timestamp: u32) -> Self {
        let generator = &*GENERATOR;
        Self {
            timestamp,
            machine: generator.machine,
            pid: generator.pid,
            increment: generator.next_increment(),
        }
    }

    /// Parses a 24 character hex string (either case).
    pub fn parse(s: &str) -> Result<Self, BsonError> {
        if s.len() != 24 {
            return Err(BsonError::format(format!(
                "{s:?} is not a valid 24 digit hex string"
            )));
        }
        let bytes = hex::decode(s).map_err(|e| {
            BsonError::format(format!("{s:?} is not a valid 24 digit hex string: {e}"))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        Self::parse(s).ok()
    }

    /// Reads an ObjectId from exactly 12 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BsonError> {
        let bytes: &[u8; 12] = bytes.try_into().map_err(|_| {
            BsonError::format(format!(
                "an ObjectId must be 12 bytes long, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::unpack(bytes))
    }

    pub fn to_bytes(&self) -> [u8; 12] {
        Self::pack(self.timestamp, self.machine, self.pid, self.increment)
    }

    /// Packs the components into the 12-byte wire layout.
    pub fn pack(timestamp: u32, machine: u32, pid: u16, increment: u32) -> [u8; 12] {
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4] = (machine >> 16) as u8;
        bytes[5] = (machine >> 8) as u8;
        bytes[6] = machine as u8;
        bytes[7..9].copy_from_slice(&pid.to_be_bytes());
        bytes[9] = (increment >> 16) as u8;
        bytes[10] = (increment >> 8) as u8;
        bytes[11] = increment as u8;
        bytes
    }

    pub fn unpack(bytes: &[u8; 12]) -> Self {
        let timestamp = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let machine = ((bytes[4] as u32) << 16) | ((bytes[5] as u32) << 8) | (bytes[6] as u32);
        let pid = u16::from_be_bytes([bytes[7], bytes[8]]);
        let increment = ((bytes[9] as u32) << 16) | ((bytes[10] as u32) << 8) | (bytes[11] as u32);
        Self {
            timestamp,
            machine,
            pid,
            increment,
        }
    }

    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn machine(&self) -> u32 {
        self.machine
    }

    pub fn pid(&self) -> u16 {
        self.pid
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }

    /// Creation time encoded in the timestamp field.
    pub fn creation_time(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp as i64, 0)
            .single()
            .unwrap_or_default()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for ObjectId {
    type Err = BsonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_exposes_components() {
        let id = ObjectId::parse("507f1f77bcf86cd799439011").unwrap();
        assert_eq!(id.timestamp(), 0x507f_1f77);
        assert_eq!(id.machine(), 0xbcf86c);
        assert_eq!(id.pid(), 0xd799);
        assert_eq!(id.increment(), 0x439011);
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn parse_accepts_upper_case_and_prints_lower_case() {
        let id: ObjectId = "507F1F77BCF86CD799439011".parse().unwrap();
        assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(matches!(ObjectId::parse(""), Err(BsonError::Format(_))));
        assert!(matches!(
            ObjectId::parse("507f1f77bcf86cd79943901"),
            Err(BsonError::Format(_))
        ));
        assert!(matches!(
            ObjectId::parse("507f1f77bcf86cd79943901z"),
            Err(BsonError::Format(_))
        ));
        assert_eq!(ObjectId::try_parse("nope"), None);
    }

    #[test]
    fn new_validates_24_bit_fields() {
        assert!(ObjectId::new(1, 0x0100_0000, 1, 1).is_err());
        assert!(ObjectId::new(1, 1, 1, 0x0100_0000).is_err());
        let id = ObjectId::new(1, 2, 3, 4).unwrap();
        assert_eq!(id.to_bytes(), [0, 0, 0, 1, 0, 0, 2, 0, 3, 0, 0, 4]);
    }

    #[test]
    fn from_bytes_requires_twelve_bytes() {
        assert!(ObjectId::from_bytes(&[0u8; 11]).is_err());
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        assert_eq!(ObjectId::from_bytes(&bytes).unwrap().to_bytes(), bytes);
    }

    #[test]
    fn ordering_follows_bytes() {
        let a = ObjectId::new(1, 0xffffff, 0xffff, 0xffffff).unwrap();
        let b = ObjectId::new(2, 0, 0, 0).unwrap();
        assert!(a < b);
        assert!(a.to_bytes() < b.to_bytes());
    }

    #[test]
    fn generated_ids_share_machine_and_pid() {
        let a = ObjectId::generate_new_id_at(42);
        let b = ObjectId::generate_new_id_at(42);
        assert_eq!(a.timestamp(), 42);
        assert_eq!(a.machine(), b.machine());
        assert_eq!(a.pid(), b.pid());
        assert_ne!(a, b);
    }

    #[test]
    fn creation_time_uses_timestamp() {
        let id = ObjectId::new(0x507f_1f77, 0, 0, 0).unwrap();
        assert_eq!(id.creation_time().timestamp(), 0x507f_1f77);
    }

    #[test]
    fn machine_hash_is_24_bits() {
        assert!(machine_hash("example.host") <= MAX_24_BITS);
        assert_eq!(machine_hash("a"), machine_hash("a"));
    }
}
