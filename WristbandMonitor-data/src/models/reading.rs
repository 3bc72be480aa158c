use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for one row of the `wristband_data` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    /// Row identifier assigned by the store
    pub id: i64,

    /// Identifier of the wristband that produced the reading
    pub device_id: String,

    /// Heart rate in beats per minute
    pub hr: i32,

    /// Skin temperature in degrees Celsius
    pub temp: f64,

    /// Blood oxygen saturation in percent
    pub spo2: i32,

    /// Estimated systolic blood pressure in mmHg
    pub bp_sys: i32,

    /// Estimated diastolic blood pressure in mmHg
    pub bp_dia: i32,

    /// When the reading was stored
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a new row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReadingRecord {
    pub device_id: String,
    pub hr: i32,
    pub temp: f64,
    pub spo2: i32,
    pub bp_sys: i32,
    pub bp_dia: i32,
    pub created_at: DateTime<Utc>,
}

impl NewReadingRecord {
    /// Attach the store-assigned id
    pub fn into_record(self, id: i64) -> ReadingRecord {
        ReadingRecord {
            id,
            device_id: self.device_id,
            hr: self.hr,
            temp: self.temp,
            spo2: self.spo2,
            bp_sys: self.bp_sys,
            bp_dia: self.bp_dia,
            created_at: self.created_at,
        }
    }
}

/// Fixed-width text form of a timestamp as kept in the `created_at` column.
///
/// Microsecond precision with a `Z` suffix keeps lexicographic and
/// chronological order identical.
pub fn to_storage_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a `created_at` column value
pub fn from_storage_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_storage_timestamp_is_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = whole + chrono::Duration::microseconds(1500);

        let a = to_storage_timestamp(&whole);
        let b = to_storage_timestamp(&later);

        assert_eq!(a, "2024-01-01T00:00:00.000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(from_storage_timestamp(&b).unwrap(), later);
    }

    #[test]
    fn test_sqlite_default_timestamp_parses() {
        // strftime('%Y-%m-%dT%H:%M:%fZ') yields millisecond precision
        let parsed = from_storage_timestamp("2024-03-05T10:11:12.345Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_millis(), 345);
    }
}
