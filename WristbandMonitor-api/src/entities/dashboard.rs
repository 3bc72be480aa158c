use chrono::TimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use wristband_monitor_domain::services::{AnalyticsState, DashboardView};

use crate::entities::analytics::AnalyticsResponse;

/// Request body for changing the dashboard window
#[derive(Debug, Deserialize, ToSchema)]
pub struct WindowChangeRequest {
    /// Time range: 1h, 6h, 24h or 7d
    pub range: String,
}

/// Request body for changing the dashboard device filter
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeviceFilterRequest {
    /// Device id, or ALL for every device
    pub device: String,
}

/// State of the server-side dashboard
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    /// One of loading, loaded or failed
    pub status: String,

    pub window: String,

    pub device_filter: String,

    /// Whether a fetch is outstanding
    pub fetching: bool,

    /// Why the last fetch failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Present once a batch has loaded, even when it is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsResponse>,
}

impl DashboardResponse {
    pub fn from_view<Tz>(view: &DashboardView, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let (status, reason, analytics) = match &view.state {
            AnalyticsState::Loading => ("loading", None, None),
            AnalyticsState::Loaded(snapshot) => {
                ("loaded", None, Some(AnalyticsResponse::from_snapshot(snapshot, tz)))
            }
            AnalyticsState::Failed { reason } => ("failed", Some(reason.clone()), None),
        };

        Self {
            status: status.to_string(),
            window: view.window.to_string(),
            device_filter: view.device_filter.to_string(),
            fetching: view.fetching,
            reason,
            analytics,
        }
    }
}
