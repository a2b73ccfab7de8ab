//! Replication timestamp: 32-bit seconds and 32-bit ordinal packed in 64 bits.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BsonTimestamp {
    value: u64,
}

impl BsonTimestamp {
    pub const fn new(seconds: u32, increment: u32) -> Self {
        Self {
            value: ((seconds as u64) << 32) | increment as u64,
        }
    }

    pub const fn from_value(value: u64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    /// Seconds since the Unix epoch (high 32 bits).
    pub fn seconds(&self) -> u32 {
        (self.value >> 32) as u32
    }

    /// Ordinal within the second (low 32 bits).
    pub fn increment(&self) -> u32 {
        self.value as u32
    }
}

impl fmt::Display for BsonTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}, {})", self.seconds(), self.increment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_seconds_high() {
        let ts = BsonTimestamp::new(0x1234_5678, 7);
        assert_eq!(ts.value(), 0x1234_5678_0000_0007);
        assert_eq!(ts.seconds(), 0x1234_5678);
        assert_eq!(ts.increment(), 7);
        assert!(BsonTimestamp::new(1, 0) > BsonTimestamp::new(0, u32::MAX));
    }
}
