use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Relative time span that bounds an analytics fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub enum TimeWindow {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "7d")]
    SevenDays,
}

impl TimeWindow {
    /// All selectable windows, shortest first
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::OneHour,
        TimeWindow::SixHours,
        TimeWindow::TwentyFourHours,
        TimeWindow::SevenDays,
    ];

    /// Span covered by the window
    pub fn duration(self) -> Duration {
        match self {
            TimeWindow::OneHour => Duration::hours(1),
            TimeWindow::SixHours => Duration::hours(6),
            TimeWindow::TwentyFourHours => Duration::hours(24),
            TimeWindow::SevenDays => Duration::days(7),
        }
    }

    /// Half-open interval `[now - duration, now)`
    pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - self.duration(), now)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::OneHour => "1h",
            TimeWindow::SixHours => "6h",
            TimeWindow::TwentyFourHours => "24h",
            TimeWindow::SevenDays => "7d",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a time window label is not one of 1h, 6h, 24h, 7d
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown time range '{0}', expected one of 1h, 6h, 24h, 7d")]
pub struct UnknownTimeWindow(pub String);

impl FromStr for TimeWindow {
    type Err = UnknownTimeWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        TimeWindow::ALL
            .into_iter()
            .find(|w| w.as_str() == label)
            .ok_or_else(|| UnknownTimeWindow(s.to_string()))
    }
}

/// Which devices the filtered view keeps
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceFilter {
    /// Every device in the fetched batch
    #[default]
    All,
    /// One concrete device id
    Device(String),
}

impl DeviceFilter {
    /// Label used for the "all devices" choice
    pub const ALL_LABEL: &'static str = "ALL";

    pub fn matches(&self, device_id: &str) -> bool {
        match self {
            DeviceFilter::All => true,
            DeviceFilter::Device(id) => id == device_id,
        }
    }
}

// Device ids are kept verbatim so every id in a batch stays selectable
impl From<&str> for DeviceFilter {
    fn from(value: &str) -> Self {
        if value == Self::ALL_LABEL {
            DeviceFilter::All
        } else {
            DeviceFilter::Device(value.to_string())
        }
    }
}

impl From<String> for DeviceFilter {
    fn from(value: String) -> Self {
        DeviceFilter::from(value.as_str())
    }
}

impl From<DeviceFilter> for String {
    fn from(filter: DeviceFilter) -> Self {
        filter.to_string()
    }
}

impl fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFilter::All => f.write_str(DeviceFilter::ALL_LABEL),
            DeviceFilter::Device(id) => f.write_str(id),
        }
    }
}

/// Percentage change between the last two readings of the filtered view
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Trends {
    pub hr: f64,
    pub temp: f64,
    pub spo2: f64,
}

/// Summary statistics over the filtered view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SummaryStats {
    /// Mean heart rate, one decimal; absent for an empty view
    pub avg_hr: Option<f64>,
    /// Mean temperature, one decimal; absent for an empty view
    pub avg_temp: Option<f64>,
    /// Mean SpO2, one decimal; absent for an empty view
    pub avg_spo2: Option<f64>,
    pub min_hr: Option<i32>,
    pub max_hr: Option<i32>,
    /// Number of readings in the filtered view
    pub total_readings: usize,
    /// Distinct devices in the unfiltered batch
    pub devices: usize,
    pub trends: Trends,
}

/// Flat, chart-ready projection of one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ChartRow {
    /// Wall-clock time of the reading in the rendering timezone
    pub time: String,
    pub hr: i32,
    pub temp: f64,
    pub spo2: i32,
    pub bp_sys: i32,
    pub bp_dia: i32,
    pub device_id: String,
}

/// Heart-rate histogram bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct HistogramBucket {
    /// Display label, e.g. `60-69` or `120+`
    pub range: String,
    /// Inclusive lower bound
    pub lower: i32,
    /// Exclusive upper bound, absent for the open-ended bucket
    pub upper: Option<i32>,
    pub count: usize,
}
