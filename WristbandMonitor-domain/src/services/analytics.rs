//! Analytics aggregation over a fetched batch of readings
//!
//! Everything except [`AnalyticsServiceTrait::fetch_window`] and
//! [`AnalyticsServiceTrait::live_devices`] is a pure function of the batch.

use std::collections::HashSet;
use std::fmt::Display;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::entities::analytics::{ChartRow, DeviceFilter, HistogramBucket, SummaryStats, TimeWindow, Trends};
use crate::entities::conversions;
use crate::entities::reading::Reading;
use crate::entities::vitals::DeviceCard;
use crate::services::vitals::device_card;
use wristband_monitor_data::repository::{ReadingRepositoryTrait, RepositoryError};

/// Upper bounds of the heart-rate histogram buckets; the last one also opens a `+` bucket
pub const HEART_RATE_BUCKET_BOUNDS: [i32; 8] = [50, 60, 70, 80, 90, 100, 110, 120];

/// Analytics service errors
#[derive(Debug, Error)]
pub enum AnalyticsServiceError {
    /// Reading from the datastore failed
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl From<RepositoryError> for AnalyticsServiceError {
    fn from(err: RepositoryError) -> Self {
        AnalyticsServiceError::PersistenceError(err.to_string())
    }
}

/// Readings of `all` that pass `filter`, order preserved
pub fn filter_readings(all: &[Reading], filter: &DeviceFilter) -> Vec<Reading> {
    match filter {
        DeviceFilter::All => all.to_vec(),
        DeviceFilter::Device(_) => all.iter()
            .filter(|r| filter.matches(&r.device_id))
            .cloned()
            .collect(),
    }
}

/// Distinct device ids in first-seen order
pub fn distinct_devices(readings: &[Reading]) -> Vec<String> {
    let mut seen = HashSet::new();
    readings.iter()
        .filter(|r| seen.insert(r.device_id.as_str()))
        .map(|r| r.device_id.clone())
        .collect()
}

/// Round to the tenth nearest the exact binary value, ties away from zero.
///
/// `0.35` is stored just below the half and rounds to `0.3`.
pub fn round_one_decimal(value: f64) -> f64 {
    let quarters = value * 4.0;
    if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        // Exact tie such as 0.25, scaling by ten is lossless here
        return (value * 10.0).round() / 10.0;
    }
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// Percentage change from `previous` to `latest`, one decimal.
///
/// A zero `previous` has no defined change and reports 0.
pub fn trend_percent(previous: f64, latest: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    round_one_decimal((latest - previous) / previous * 100.0)
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> Option<f64> {
    if count == 0 {
        return None;
    }
    Some(round_one_decimal(values.sum::<f64>() / count as f64))
}

/// Trends from the last two readings of `filtered`; all zero when fewer than two exist
pub fn compute_trends(filtered: &[Reading]) -> Trends {
    match filtered {
        [.., previous, latest] => Trends {
            hr: trend_percent(previous.hr as f64, latest.hr as f64),
            temp: trend_percent(previous.temp, latest.temp),
            spo2: trend_percent(previous.spo2 as f64, latest.spo2 as f64),
        },
        _ => Trends::default(),
    }
}

/// Summary statistics of `filtered`; the device count comes from the unfiltered `all`
pub fn summarize(all: &[Reading], filtered: &[Reading]) -> SummaryStats {
    let count = filtered.len();

    SummaryStats {
        avg_hr: mean(filtered.iter().map(|r| r.hr as f64), count),
        avg_temp: mean(filtered.iter().map(|r| r.temp), count),
        avg_spo2: mean(filtered.iter().map(|r| r.spo2 as f64), count),
        min_hr: filtered.iter().map(|r| r.hr).min(),
        max_hr: filtered.iter().map(|r| r.hr).max(),
        total_readings: count,
        devices: distinct_devices(all).len(),
        trends: compute_trends(filtered),
    }
}

/// Index of the histogram bucket holding `hr`.
///
/// Values below zero land in the first bucket so every reading is counted.
fn bucket_index(hr: i32) -> usize {
    HEART_RATE_BUCKET_BOUNDS
        .iter()
        .position(|&upper| hr < upper)
        .unwrap_or(HEART_RATE_BUCKET_BOUNDS.len())
}

/// Heart-rate histogram of `filtered`, ascending by lower bound
pub fn heart_rate_histogram(filtered: &[Reading]) -> Vec<HistogramBucket> {
    let mut counts = [0usize; HEART_RATE_BUCKET_BOUNDS.len() + 1];
    for reading in filtered {
        counts[bucket_index(reading.hr)] += 1;
    }

    let mut buckets: Vec<HistogramBucket> = HEART_RATE_BUCKET_BOUNDS
        .iter()
        .enumerate()
        .map(|(i, &upper)| {
            let lower = if i == 0 { 0 } else { HEART_RATE_BUCKET_BOUNDS[i - 1] };
            HistogramBucket {
                range: format!("{}-{}", lower, upper - 1),
                lower,
                upper: Some(upper),
                count: counts[i],
            }
        })
        .collect();

    let last = HEART_RATE_BUCKET_BOUNDS[HEART_RATE_BUCKET_BOUNDS.len() - 1];
    buckets.push(HistogramBucket {
        range: format!("{}+", last),
        lower: last,
        upper: None,
        count: counts[HEART_RATE_BUCKET_BOUNDS.len()],
    });

    buckets
}

/// Chart rows for `filtered`, times rendered as `HH:MM:SS` in `tz`
pub fn chart_rows<Tz>(filtered: &[Reading], tz: &Tz) -> Vec<ChartRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    filtered.iter()
        .map(|r| ChartRow {
            time: r.created_at.with_timezone(tz).format("%H:%M:%S").to_string(),
            hr: r.hr,
            temp: r.temp,
            spo2: r.spo2,
            bp_sys: r.bp_sys,
            bp_dia: r.bp_dia,
            device_id: r.device_id.clone(),
        })
        .collect()
}

/// Trait for analytics service operations
#[async_trait]
pub trait AnalyticsServiceTrait: Send + Sync {
    /// Fetch every reading in `window` ending now, oldest first
    async fn fetch_window(&self, window: TimeWindow) -> Result<Vec<Reading>, AnalyticsServiceError>;

    /// Latest reading per device with vital statuses, most recently active first
    async fn live_devices(&self) -> Result<Vec<DeviceCard>, AnalyticsServiceError>;
}

/// Analytics service reading through a repository
pub struct AnalyticsService<R: ReadingRepositoryTrait> {
    repository: R,
}

impl<R: ReadingRepositoryTrait> AnalyticsService<R> {
    /// Create a new analytics service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: ReadingRepositoryTrait> AnalyticsServiceTrait for AnalyticsService<R> {
    async fn fetch_window(&self, window: TimeWindow) -> Result<Vec<Reading>, AnalyticsServiceError> {
        let (start, end) = window.bounds(Utc::now());
        debug!("Fetching readings for window {} ({} .. {})", window, start, end);

        let records = self.repository.fetch_range(start, end).await.map_err(|e| {
            error!("Failed to fetch readings for window {}: {}", window, e);
            AnalyticsServiceError::from(e)
        })?;

        info!("Fetched {} readings for window {}", records.len(), window);
        Ok(records.into_iter().map(conversions::convert_to_domain_reading).collect())
    }

    async fn live_devices(&self) -> Result<Vec<DeviceCard>, AnalyticsServiceError> {
        let records = self.repository.latest_per_device().await.map_err(|e| {
            error!("Failed to fetch latest readings: {}", e);
            AnalyticsServiceError::from(e)
        })?;

        Ok(records.into_iter()
            .map(conversions::convert_to_domain_reading)
            .map(device_card)
            .collect())
    }
}

/// Create an analytics service over the given repository
pub fn create_analytics_service<R>(repository: R) -> impl AnalyticsServiceTrait
where
    R: ReadingRepositoryTrait + 'static,
{
    AnalyticsService::new(repository)
}
