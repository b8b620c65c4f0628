//! # Temporal Types -- UTC Creation Timestamps
//!
//! `createdAt` is informational only: records are ordered by position in
//! the manifest, never by timestamp, and conflicts are never resolved by
//! comparing times.
//!
//! Timestamps serialize as RFC 3339 with millisecond precision and a `Z`
//! suffix (`2026-01-15T12:00:00.250Z`). Deserialization also accepts a
//! bare integer of Unix milliseconds, which older catalog tooling wrote.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Earliest instant RFC 3339 can express: `0000-01-01T00:00:00.000Z`.
pub const MIN_UNIX_MILLIS: i64 = -62_167_219_200_000;

/// Latest instant RFC 3339 can express: `9999-12-31T23:59:59.999Z`.
pub const MAX_UNIX_MILLIS: i64 = 253_402_300_799_999;

/// A UTC instant truncated to millisecond precision, within the four-digit
/// years RFC 3339 allows. Every value serializes to text that parses back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time, truncated to milliseconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now()).unwrap_or_default()
    }

    /// Create a timestamp from a `DateTime<Utc>`, truncating below
    /// milliseconds. Returns `None` outside years 0000 through 9999.
    pub fn from_utc(dt: DateTime<Utc>) -> Option<Self> {
        Self::from_unix_millis(dt.timestamp_millis())
    }

    /// Create a timestamp from Unix milliseconds. Returns `None` outside
    /// [`MIN_UNIX_MILLIS`]..=[`MAX_UNIX_MILLIS`].
    pub fn from_unix_millis(ms: i64) -> Option<Self> {
        if !(MIN_UNIX_MILLIS..=MAX_UNIX_MILLIS).contains(&ms) {
            return None;
        }
        DateTime::from_timestamp_millis(ms).map(Self)
    }

    /// Milliseconds since the Unix epoch.
    pub fn unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render as RFC 3339 with milliseconds and `Z` suffix.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self(DateTime::UNIX_EPOCH)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Millis(i64),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Text(s) => {
                let dt = DateTime::parse_from_rfc3339(&s).map_err(|e| {
                    serde::de::Error::custom(format!("invalid timestamp {s:?}: {e}"))
                })?;
                // An offset can push a year-0000 or year-9999 instant out of range in UTC.
                Self::from_utc(dt.with_timezone(&Utc)).ok_or_else(|| {
                    serde::de::Error::custom(format!("timestamp out of range: {s}"))
                })
            }
            RawTimestamp::Millis(ms) => Self::from_unix_millis(ms).ok_or_else(|| {
                serde::de::Error::custom(format!("timestamp out of range: {ms}"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn now_is_truncated_to_millis() {
        let ts = Timestamp::now();
        assert_eq!(ts.as_datetime().nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn serializes_with_millis_and_z() {
        let dt = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let ts = Timestamp::from_utc(dt).unwrap();
        assert_eq!(
            serde_json::to_string(&ts).unwrap(),
            "\"2026-01-15T12:00:00.000Z\""
        );
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let ts: Timestamp = serde_json::from_str("\"2026-01-15T17:00:00+05:00\"").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-01-15T12:00:00.000Z");
    }

    #[test]
    fn accepts_unix_millis() {
        let ts: Timestamp = serde_json::from_str("1768478400250").unwrap();
        assert_eq!(ts.unix_millis(), 1_768_478_400_250);
    }

    #[test]
    fn bounds_round_trip_through_text() {
        for ms in [MIN_UNIX_MILLIS, -1, 0, MAX_UNIX_MILLIS] {
            let ts = Timestamp::from_unix_millis(ms).unwrap();
            let json = serde_json::to_string(&ts).unwrap();
            let back: Timestamp = serde_json::from_str(&json).unwrap();
            assert_eq!(back, ts, "{json}");
        }
        assert_eq!(
            Timestamp::from_unix_millis(MAX_UNIX_MILLIS).unwrap().to_rfc3339(),
            "9999-12-31T23:59:59.999Z"
        );
        assert_eq!(
            Timestamp::from_unix_millis(MIN_UNIX_MILLIS).unwrap().to_rfc3339(),
            "0000-01-01T00:00:00.000Z"
        );
    }

    #[test]
    fn five_digit_years_are_rejected() {
        assert!(Timestamp::from_unix_millis(MAX_UNIX_MILLIS + 1).is_none());
        assert!(Timestamp::from_unix_millis(MIN_UNIX_MILLIS - 1).is_none());
        assert!(serde_json::from_str::<Timestamp>("300000000000000").is_err());
        assert!(serde_json::from_str::<Timestamp>("-62167219200001").is_err());
        let far = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
        assert!(Timestamp::from_utc(far).is_none());
    }

    #[test]
    fn offset_pushing_past_year_zero_is_rejected() {
        assert!(serde_json::from_str::<Timestamp>("\"0000-01-01T00:00:00+05:00\"").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Timestamp>("\"yesterday\"").is_err());
    }
}
