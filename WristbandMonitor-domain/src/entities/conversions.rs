use chrono::{DateTime, Utc};

use crate::entities::reading::{IngestRequest, Reading};
use crate::entities::vitals::BloodPressureEstimate;
use wristband_monitor_data::models::{NewReadingRecord, ReadingRecord};

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Convert from data model to domain entity for a stored reading
pub fn convert_to_domain_reading(record: ReadingRecord) -> Reading {
    Reading {
        device_id: record.device_id,
        hr: record.hr,
        temp: record.temp,
        spo2: record.spo2,
        bp_sys: record.bp_sys,
        bp_dia: record.bp_dia,
        created_at: record.created_at,
    }
}

/// Convert a validated ingest request into the row to insert
pub fn convert_to_data_new_reading(
    request: &IngestRequest,
    blood_pressure: BloodPressureEstimate,
    created_at: DateTime<Utc>,
) -> NewReadingRecord {
    NewReadingRecord {
        device_id: request.device_id.clone(),
        hr: request.hr,
        temp: request.temp,
        spo2: request.spo2,
        bp_sys: blood_pressure.systolic,
        bp_dia: blood_pressure.diastolic,
        created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_convert_to_domain_reading() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = ReadingRecord {
            id: 7,
            device_id: "W1".to_string(),
            hr: 72,
            temp: 36.6,
            spo2: 98,
            bp_sys: 100,
            bp_dia: 70,
            created_at,
        };

        let reading = convert_to_domain_reading(record.clone());

        assert_eq!(reading.device_id, record.device_id);
        assert_eq!(reading.hr, record.hr);
        assert_eq!(reading.temp, record.temp);
        assert_eq!(reading.spo2, record.spo2);
        assert_eq!(reading.bp_sys, record.bp_sys);
        assert_eq!(reading.bp_dia, record.bp_dia);
        assert_eq!(reading.created_at, created_at);
    }

    #[test]
    fn test_convert_to_data_new_reading() {
        let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let request = IngestRequest {
            device_id: "W1".to_string(),
            hr: 80,
            temp: 0.0,
            spo2: 95,
        };
        let bp = BloodPressureEstimate { systolic: 112, diastolic: 72 };

        let row = convert_to_data_new_reading(&request, bp, created_at);

        assert_eq!(row.device_id, "W1");
        assert_eq!(row.hr, 80);
        assert_eq!(row.spo2, 95);
        assert_eq!(row.bp_sys, 112);
        assert_eq!(row.bp_dia, 72);
        assert_eq!(row.created_at, created_at);
    }
}
