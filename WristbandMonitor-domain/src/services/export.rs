use chrono::{DateTime, SecondsFormat, Utc};

use crate::entities::reading::Reading;

pub const CSV_HEADER: &str = "device_id,hr,temp,spo2,bp_sys,bp_dia,created_at";

/// Quote a field when it contains a delimiter, quote or line break
fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(reading: &Reading) -> String {
    [
        escape_field(&reading.device_id),
        reading.hr.to_string(),
        reading.temp.to_string(),
        reading.spo2.to_string(),
        reading.bp_sys.to_string(),
        reading.bp_dia.to_string(),
        reading.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    ]
    .join(",")
}

/// Render the filtered view as CSV, one row per reading in view order.
///
/// Returns `None` for an empty view so callers can skip the download.
pub fn export_csv(filtered: &[Reading]) -> Option<String> {
    if filtered.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(filtered.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(filtered.iter().map(csv_row));
    Some(lines.join("\n"))
}

/// Download name for an export taken at `now`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("wristband_data_{}.csv", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(device_id: &str) -> Reading {
        Reading {
            device_id: device_id.to_string(),
            hr: 72,
            temp: 36.6,
            spo2: 98,
            bp_sys: 100,
            bp_dia: 70,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_export_single_reading() {
        let csv = export_csv(&[reading("A")]).unwrap();
        assert_eq!(
            csv,
            "device_id,hr,temp,spo2,bp_sys,bp_dia,created_at\nA,72,36.6,98,100,70,2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_export_empty_view() {
        assert_eq!(export_csv(&[]), None);
    }

    #[test]
    fn test_export_quotes_awkward_device_ids() {
        let csv = export_csv(&[reading("W,1"), reading("say \"hi\"")]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("\"W,1\",72,"));
        assert!(lines[2].starts_with("\"say \"\"hi\"\"\",72,"));
    }

    #[test]
    fn test_export_keeps_fraction_and_zero_temperature() {
        let mut r = reading("A");
        r.temp = 0.0;
        r.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::milliseconds(250);
        let csv = export_csv(&[r]).unwrap();
        assert!(csv.ends_with("A,72,0,98,100,70,2024-01-01T00:00:00.250Z"));
    }

    #[test]
    fn test_export_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(export_file_name(now), "wristband_data_1704067200000.csv");
    }
}
