use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::reading::Reading;

/// Colour band of a vital sign on the live view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum VitalStatus {
    /// Within the comfortable band (green)
    Normal,
    /// Near the edge of the normal range (yellow)
    Warning,
    /// Outside the normal range (red)
    Critical,
}

impl VitalStatus {
    /// Display colour used by the dashboard
    pub fn color(self) -> &'static str {
        match self {
            VitalStatus::Normal => "green",
            VitalStatus::Warning => "yellow",
            VitalStatus::Critical => "red",
        }
    }
}

/// Systolic/diastolic pair derived from heart rate and SpO2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressureEstimate {
    pub systolic: i32,
    pub diastolic: i32,
}

/// Latest reading of one device with a status per vital sign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DeviceCard {
    pub device_id: String,
    pub latest: Reading,
    pub hr_status: VitalStatus,
    pub temp_status: VitalStatus,
    pub spo2_status: VitalStatus,
    pub bp_status: VitalStatus,
}
