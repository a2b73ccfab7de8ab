//! UTC date-time stored as milliseconds since the Unix epoch.

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// BSON UTC date-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BsonDateTime {
    millis: i64,
}

impl BsonDateTime {
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn now() -> Self {
        Utc::now().into()
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// The instant as a chrono value, if it is within chrono's range.
    pub fn to_chrono(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.millis).single()
    }
}

/// Any time zone is normalized to UTC.
impl<Tz: TimeZone> From<DateTime<Tz>> for BsonDateTime {
    fn from(dt: DateTime<Tz>) -> Self {
        Self {
            millis: dt.with_timezone(&Utc).timestamp_millis(),
        }
    }
}

impl fmt::Display for BsonDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_chrono() {
            Some(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => write!(f, "{}ms", self.millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn offsets_are_normalized_to_utc() {
        let east = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = east.with_ymd_and_hms(2012, 1, 1, 2, 0, 0).unwrap();
        let utc = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(BsonDateTime::from(local), BsonDateTime::from(utc));
    }

    #[test]
    fn displays_iso_8601() {
        let dt = BsonDateTime::from_millis(1_325_376_000_123);
        assert_eq!(dt.to_string(), "2012-01-01T00:00:00.123Z");
    }

    #[test]
    fn out_of_range_millis_still_display() {
        let dt = BsonDateTime::from_millis(i64::MAX);
        assert_eq!(dt.to_chrono(), None);
        assert_eq!(dt.to_string(), format!("{}ms", i64::MAX));
    }
}
