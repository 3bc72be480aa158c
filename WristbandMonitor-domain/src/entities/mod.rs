// Domain entities and value objects
pub mod analytics;
pub mod conversions;
pub mod reading;
pub mod vitals;

// Re-export common types for easier imports
pub use analytics::{ChartRow, DeviceFilter, HistogramBucket, SummaryStats, TimeWindow, Trends, UnknownTimeWindow};
pub use reading::{IngestRequest, Reading};
pub use vitals::{BloodPressureEstimate, DeviceCard, VitalStatus};
