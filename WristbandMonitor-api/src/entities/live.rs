use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use wristband_monitor_domain::entities::{DeviceCard, Reading};

/// Latest reading of one device with a display colour per vital
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LiveDevice {
    pub device_id: String,

    /// Most recent reading
    pub latest: Reading,

    /// Colour of the heart-rate value: green, yellow or red
    pub hr_color: String,

    pub temp_color: String,

    pub spo2_color: String,

    /// Colour of the estimated blood pressure
    pub bp_color: String,
}

impl From<DeviceCard> for LiveDevice {
    fn from(card: DeviceCard) -> Self {
        Self {
            device_id: card.device_id,
            latest: card.latest,
            hr_color: card.hr_status.color().to_string(),
            temp_color: card.temp_status.color().to_string(),
            spo2_color: card.spo2_status.color().to_string(),
            bp_color: card.bp_status.color().to_string(),
        }
    }
}

/// Live view of every device, most recently active first
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LiveResponse {
    pub devices: Vec<LiveDevice>,
}
