use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use wristband_monitor_domain::entities::{ChartRow, DeviceFilter, HistogramBucket, SummaryStats, TimeWindow};
use wristband_monitor_domain::services::AnalyticsSnapshot;

use crate::entities::common::ErrorResponse;

/// Query parameters selecting an analytics view
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Time range: 1h, 6h, 24h or 7d (default: configured range)
    pub range: Option<String>,

    /// Device id, or ALL for every device (default: ALL)
    pub device: Option<String>,
}

impl AnalyticsQuery {
    /// Resolve the requested window, falling back to `default`
    pub fn window(&self, default: TimeWindow) -> Result<TimeWindow, ErrorResponse> {
        match self.range.as_deref() {
            None | Some("") => Ok(default),
            Some(range) => range
                .parse()
                .map_err(|e: wristband_monitor_domain::entities::UnknownTimeWindow| {
                    ErrorResponse::bad_request(&e.to_string())
                }),
        }
    }

    pub fn device_filter(&self) -> DeviceFilter {
        match self.device.as_deref() {
            None | Some("") => DeviceFilter::All,
            Some(device) => DeviceFilter::from(device),
        }
    }
}

/// Analytics view of one window and device filter
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsResponse {
    /// Selected time range label
    pub window: String,

    /// Selected device, or ALL
    pub device_filter: String,

    /// Devices present in the window, in first-seen order
    pub devices: Vec<String>,

    /// Summary statistics over the filtered readings
    pub stats: SummaryStats,

    /// Chart-ready rows, oldest first
    pub chart: Vec<ChartRow>,

    /// Heart-rate histogram of the filtered readings
    pub histogram: Vec<HistogramBucket>,

    /// When the readings were fetched
    pub fetched_at: DateTime<Utc>,
}

impl AnalyticsResponse {
    /// Render a snapshot with chart times in `tz`
    pub fn from_snapshot<Tz>(snapshot: &AnalyticsSnapshot, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            window: snapshot.window.to_string(),
            device_filter: snapshot.device_filter.to_string(),
            devices: snapshot.devices.clone(),
            stats: snapshot.stats.clone(),
            chart: snapshot.chart_rows(tz),
            histogram: snapshot.histogram(),
            fetched_at: snapshot.fetched_at,
        }
    }
}
