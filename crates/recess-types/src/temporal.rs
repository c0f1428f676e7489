use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// UTC wall-clock timestamp.
///
/// Stored in documents as an RFC 3339 string with millisecond precision, so
/// files stay human-readable and lexicographic order matches time order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current wall-clock time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Midnight UTC at the start of `day`.
    pub fn start_of_day(day: NaiveDate) -> Self {
        Self(Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN)))
    }

    /// Parse an RFC 3339 string.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| TypeError::InvalidTimestamp(format!("{s}: {e}")))
    }

    /// Milliseconds since the UNIX epoch.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// The calendar day (UTC).
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// RFC 3339 form used inside documents.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// JSON value form used inside documents.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::String(self.to_rfc3339())
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.to_rfc3339())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_after_2020() {
        assert!(Timestamp::now().epoch_millis() > 1_577_836_800_000);
    }

    #[test]
    fn rfc3339_roundtrip_keeps_millis() {
        let ts = Timestamp::parse("2024-01-05T10:30:00.123Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-05T10:30:00.123Z");
        assert_eq!(Timestamp::parse(&ts.to_rfc3339()).unwrap(), ts);
    }

    #[test]
    fn parse_converts_offsets_to_utc() {
        let ts = Timestamp::parse("2024-01-05T01:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-04T23:00:00.000Z");
    }

    #[test]
    fn start_of_day_is_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let ts = Timestamp::start_of_day(day);
        assert_eq!(ts.epoch_millis(), 1_704_412_800_000);
        assert_eq!(ts.date(), day);
    }

    #[test]
    fn ordering_follows_time() {
        let a = Timestamp::parse("2024-01-05T00:00:00Z").unwrap();
        let b = Timestamp::parse("2024-01-06T00:00:00Z").unwrap();
        assert!(a < b);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Timestamp::parse("yesterday").is_err());
    }
}
