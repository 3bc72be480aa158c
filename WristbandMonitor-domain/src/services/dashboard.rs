//! Analytics dashboard state
//!
//! [`DashboardSession`] is the synchronous state machine: it owns the selected
//! window and device filter, the last fetched batch and the fetch tickets that
//! decide which result is allowed to land. [`DashboardMonitor`] drives a
//! session against an [`AnalyticsServiceTrait`] and polls it on a timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::entities::analytics::{ChartRow, DeviceFilter, HistogramBucket, SummaryStats, TimeWindow};
use crate::entities::reading::Reading;
use crate::services::analytics::{
    chart_rows, distinct_devices, filter_readings, heart_rate_histogram, summarize, AnalyticsServiceTrait,
};
use crate::services::export::export_csv;

/// Default interval between background refreshes
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Everything derived from one fetched batch under one device filter
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsSnapshot {
    pub window: TimeWindow,
    pub device_filter: DeviceFilter,
    /// Unfiltered batch as returned by the fetch, oldest first
    pub all: Arc<Vec<Reading>>,
    pub filtered: Vec<Reading>,
    /// Devices present in the unfiltered batch, first-seen order
    pub devices: Vec<String>,
    pub stats: SummaryStats,
    pub fetched_at: DateTime<Utc>,
}

impl AnalyticsSnapshot {
    /// Same batch seen through another device filter
    pub fn with_filter(&self, device_filter: DeviceFilter) -> Self {
        reduce(self.window, device_filter, Arc::clone(&self.all), self.fetched_at)
    }

    pub fn histogram(&self) -> Vec<HistogramBucket> {
        heart_rate_histogram(&self.filtered)
    }

    pub fn chart_rows<Tz>(&self, tz: &Tz) -> Vec<ChartRow>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        chart_rows(&self.filtered, tz)
    }

    pub fn to_csv(&self) -> Option<String> {
        export_csv(&self.filtered)
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }
}

/// Derive the filtered view, device list and statistics from a raw batch
pub fn reduce(
    window: TimeWindow,
    device_filter: DeviceFilter,
    batch: Arc<Vec<Reading>>,
    fetched_at: DateTime<Utc>,
) -> AnalyticsSnapshot {
    let filtered = filter_readings(&batch, &device_filter);
    let stats = summarize(&batch, &filtered);
    let devices = distinct_devices(&batch);

    AnalyticsSnapshot {
        window,
        device_filter,
        all: batch,
        filtered,
        devices,
        stats,
        fetched_at,
    }
}

/// What the analytics view currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsState {
    /// No batch for the selected window yet
    Loading,
    /// A batch arrived; it may be empty
    Loaded(AnalyticsSnapshot),
    /// The last fetch failed
    Failed { reason: String },
}

impl AnalyticsState {
    pub fn snapshot(&self) -> Option<&AnalyticsSnapshot> {
        match self {
            AnalyticsState::Loaded(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Handle for one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: u64,
    pub window: TimeWindow,
}

/// Selection plus state of one analytics view.
///
/// Only the most recently issued ticket may complete; results carried by
/// older tickets are dropped.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    window: TimeWindow,
    device_filter: DeviceFilter,
    state: AnalyticsState,
    last_ticket: u64,
    in_flight: Option<u64>,
}

impl DashboardSession {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            device_filter: DeviceFilter::All,
            state: AnalyticsState::Loading,
            last_ticket: 0,
            in_flight: None,
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn device_filter(&self) -> &DeviceFilter {
        &self.device_filter
    }

    pub fn state(&self) -> &AnalyticsState {
        &self.state
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    fn issue_ticket(&mut self) -> FetchTicket {
        self.last_ticket += 1;
        self.in_flight = Some(self.last_ticket);
        FetchTicket { id: self.last_ticket, window: self.window }
    }

    /// Start a periodic refresh unless a fetch is already outstanding.
    ///
    /// The current state stays visible while the refresh runs.
    pub fn begin_poll(&mut self) -> Option<FetchTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        Some(self.issue_ticket())
    }

    /// Switch to another window; any outstanding fetch is superseded
    pub fn set_window(&mut self, window: TimeWindow) -> FetchTicket {
        self.window = window;
        self.state = AnalyticsState::Loading;
        self.issue_ticket()
    }

    /// Apply the outcome of a fetch. Returns false when the ticket was superseded.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Reading>, String>,
        fetched_at: DateTime<Utc>,
    ) -> bool {
        if self.in_flight != Some(ticket.id) {
            return false;
        }
        self.in_flight = None;

        self.state = match result {
            Ok(batch) => AnalyticsState::Loaded(reduce(
                ticket.window,
                self.device_filter.clone(),
                Arc::new(batch),
                fetched_at,
            )),
            Err(reason) => AnalyticsState::Failed { reason },
        };
        true
    }

    /// Change the device filter, recomputing from the retained batch
    pub fn set_device_filter(&mut self, device_filter: DeviceFilter) {
        if let AnalyticsState::Loaded(snapshot) = &self.state {
            self.state = AnalyticsState::Loaded(snapshot.with_filter(device_filter.clone()));
        }
        self.device_filter = device_filter;
    }
}

/// Point-in-time copy of a session for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub window: TimeWindow,
    pub device_filter: DeviceFilter,
    pub fetching: bool,
    pub state: AnalyticsState,
}

impl From<&DashboardSession> for DashboardView {
    fn from(session: &DashboardSession) -> Self {
        Self {
            window: session.window,
            device_filter: session.device_filter.clone(),
            fetching: session.is_fetching(),
            state: session.state.clone(),
        }
    }
}

/// Server-side analytics dashboard refreshed from an analytics service
pub struct DashboardMonitor {
    analytics: Arc<dyn AnalyticsServiceTrait>,
    session: RwLock<DashboardSession>,
}

impl DashboardMonitor {
    pub fn new(analytics: Arc<dyn AnalyticsServiceTrait>, window: TimeWindow) -> Self {
        Self {
            analytics,
            session: RwLock::new(DashboardSession::new(window)),
        }
    }

    /// Re-fetch the current window. Returns false when skipped or superseded.
    pub async fn refresh(&self) -> bool {
        let ticket = self.session.write().await.begin_poll();
        match ticket {
            Some(ticket) => self.run_fetch(ticket).await,
            None => {
                debug!("Skipping dashboard refresh, a fetch is already in flight");
                false
            }
        }
    }

    /// Select a window and fetch it. Returns false when superseded by a later change.
    pub async fn change_window(&self, window: TimeWindow) -> bool {
        let ticket = self.session.write().await.set_window(window);
        info!("Dashboard window changed to {}", window);
        self.run_fetch(ticket).await
    }

    /// Select a device filter without fetching
    pub async fn change_device_filter(&self, device_filter: DeviceFilter) -> DashboardView {
        let mut session = self.session.write().await;
        debug!("Dashboard device filter changed to {}", device_filter);
        session.set_device_filter(device_filter);
        DashboardView::from(&*session)
    }

    pub async fn view(&self) -> DashboardView {
        DashboardView::from(&*self.session.read().await)
    }

    async fn run_fetch(&self, ticket: FetchTicket) -> bool {
        let result = self.analytics
            .fetch_window(ticket.window)
            .await
            .map_err(|e| e.to_string());

        if let Err(reason) = &result {
            warn!("Dashboard fetch {} for window {} failed: {}", ticket.id, ticket.window, reason);
        }

        let applied = self.session.write().await.complete_fetch(ticket, result, Utc::now());
        if !applied {
            debug!("Discarded stale dashboard fetch {}", ticket.id);
        }
        applied
    }

    /// Refresh immediately, then every `interval`, until the task is aborted
    pub fn spawn_polling(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        info!("Polling analytics every {:?}", interval);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analytics::AnalyticsServiceError;
    use crate::entities::vitals::DeviceCard;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + ChronoDuration::minutes(minutes)
    }

    fn reading(device_id: &str, hr: i32, minutes: i64) -> Reading {
        Reading {
            device_id: device_id.to_string(),
            hr,
            temp: 36.6,
            spo2: 98,
            bp_sys: 100,
            bp_dia: 70,
            created_at: at(minutes),
        }
    }

    fn batch() -> Vec<Reading> {
        vec![
            reading("W1", 65, 0),
            reading("W2", 110, 1),
            reading("W1", 70, 2),
            reading("W2", 100, 3),
            reading("W1", 75, 4),
        ]
    }

    #[test]
    fn test_reduce_matches_fetch_then_filter() {
        let all = Arc::new(batch());
        let unfiltered = reduce(TimeWindow::OneHour, DeviceFilter::All, Arc::clone(&all), at(10));

        for device in ["W1", "W2", "W9"] {
            let recombined = unfiltered.with_filter(DeviceFilter::from(device));

            let independent: Vec<Reading> = batch().into_iter().filter(|r| r.device_id == device).collect();
            let direct = reduce(TimeWindow::OneHour, DeviceFilter::from(device), Arc::new(batch()), at(10));

            assert_eq!(recombined.filtered, independent);
            assert_eq!(recombined.stats, direct.stats);
            assert_eq!(recombined.histogram(), direct.histogram());
        }

        assert_eq!(unfiltered.devices, vec!["W1".to_string(), "W2".to_string()]);
        assert_eq!(unfiltered.stats.total_readings, 5);
    }

    #[test]
    fn test_every_listed_device_is_selectable() {
        let batch = vec![reading("all", 60, 0), reading(" W1", 70, 1), reading("W2", 80, 2)];
        let unfiltered = reduce(TimeWindow::OneHour, DeviceFilter::All, Arc::new(batch), at(10));
        assert_eq!(unfiltered.devices.len(), 3);

        for device in &unfiltered.devices {
            let selected = unfiltered.with_filter(DeviceFilter::from(device.as_str()));
            assert_eq!(selected.device_filter, DeviceFilter::Device(device.clone()));
            assert_eq!(selected.stats.total_readings, 1, "device {:?}", device);
            assert!(selected.filtered.iter().all(|r| &r.device_id == device));
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = DashboardSession::new(TimeWindow::OneHour);
        assert_eq!(session.state(), &AnalyticsState::Loading);

        let ticket = session.begin_poll().unwrap();
        assert!(session.is_fetching());
        assert!(session.begin_poll().is_none());

        assert!(session.complete_fetch(ticket, Ok(batch()), at(10)));
        assert!(!session.is_fetching());
        let snapshot = session.state().snapshot().unwrap();
        assert_eq!(snapshot.stats.total_readings, 5);

        // A periodic refresh keeps showing the previous snapshot
        let ticket = session.begin_poll().unwrap();
        assert!(session.state().snapshot().is_some());

        assert!(session.complete_fetch(ticket, Err("timeout".to_string()), at(11)));
        assert_eq!(session.state(), &AnalyticsState::Failed { reason: "timeout".to_string() });

        let ticket = session.begin_poll().unwrap();
        assert!(session.complete_fetch(ticket, Ok(Vec::new()), at(12)));
        let snapshot = session.state().snapshot().unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.to_csv(), None);
    }

    #[test]
    fn test_window_change_supersedes_in_flight_fetch() {
        let mut session = DashboardSession::new(TimeWindow::TwentyFourHours);
        let slow = session.begin_poll().unwrap();

        let fast = session.set_window(TimeWindow::OneHour);
        assert_eq!(session.state(), &AnalyticsState::Loading);
        assert!(fast.id > slow.id);

        assert!(session.complete_fetch(fast, Ok(vec![reading("W1", 80, 0)]), at(1)));
        assert!(!session.complete_fetch(slow, Ok(batch()), at(2)));

        let snapshot = session.state().snapshot().unwrap();
        assert_eq!(snapshot.window, TimeWindow::OneHour);
        assert_eq!(snapshot.stats.total_readings, 1);
    }

    #[test]
    fn test_stale_failure_does_not_overwrite_newer_result() {
        let mut session = DashboardSession::new(TimeWindow::SixHours);
        let first = session.set_window(TimeWindow::SixHours);
        let second = session.set_window(TimeWindow::SevenDays);

        assert!(session.complete_fetch(second, Ok(batch()), at(1)));
        assert!(!session.complete_fetch(first, Err("late".to_string()), at(2)));
        assert!(session.state().snapshot().is_some());
    }

    #[test]
    fn test_device_filter_does_not_fetch() {
        let mut session = DashboardSession::new(TimeWindow::OneHour);
        let ticket = session.begin_poll().unwrap();
        session.complete_fetch(ticket, Ok(batch()), at(10));

        session.set_device_filter(DeviceFilter::from("W1"));
        assert!(!session.is_fetching());
        let snapshot = session.state().snapshot().unwrap();
        assert_eq!(snapshot.stats.total_readings, 3);
        assert_eq!(snapshot.stats.devices, 2);
        assert_eq!(snapshot.stats.trends.hr, 7.1);

        // The filter carries over to the next batch
        let ticket = session.begin_poll().unwrap();
        session.complete_fetch(ticket, Ok(batch()), at(11));
        assert_eq!(session.state().snapshot().unwrap().filtered.len(), 3);

        // And is remembered while no batch is loaded
        session.set_window(TimeWindow::SevenDays);
        session.set_device_filter(DeviceFilter::from("W2"));
        assert_eq!(session.device_filter(), &DeviceFilter::from("W2"));
        assert_eq!(session.state(), &AnalyticsState::Loading);
    }

    /// Analytics stub serving a fixed batch per window, optionally holding one window back
    struct StubAnalytics {
        batches: HashMap<TimeWindow, Vec<Reading>>,
        held: Option<(TimeWindow, Arc<Notify>)>,
        fetches: AtomicUsize,
    }

    impl StubAnalytics {
        fn new(batches: HashMap<TimeWindow, Vec<Reading>>) -> Self {
            Self { batches, held: None, fetches: AtomicUsize::new(0) }
        }
    }

    #[async_trait]
    impl AnalyticsServiceTrait for StubAnalytics {
        async fn fetch_window(&self, window: TimeWindow) -> Result<Vec<Reading>, AnalyticsServiceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some((held_window, gate)) = &self.held {
                if *held_window == window {
                    gate.notified().await;
                }
            }
            self.batches
                .get(&window)
                .cloned()
                .ok_or_else(|| AnalyticsServiceError::PersistenceError("no such window".to_string()))
        }

        async fn live_devices(&self) -> Result<Vec<DeviceCard>, AnalyticsServiceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_monitor_refresh_and_filter() {
        let stub = Arc::new(StubAnalytics::new(HashMap::from([(TimeWindow::OneHour, batch())])));
        let monitor = DashboardMonitor::new(stub.clone(), TimeWindow::OneHour);

        assert_eq!(monitor.view().await.state, AnalyticsState::Loading);
        assert!(monitor.refresh().await);

        let view = monitor.change_device_filter(DeviceFilter::from("W2")).await;
        let snapshot = view.state.snapshot().unwrap();
        assert_eq!(snapshot.stats.total_readings, 2);
        assert_eq!(stub.fetches.load(Ordering::SeqCst), 1);

        // No batch is served for 7d
        assert!(monitor.change_window(TimeWindow::SevenDays).await);
        assert!(matches!(monitor.view().await.state, AnalyticsState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_monitor_discards_superseded_fetch() {
        let gate = Arc::new(Notify::new());
        let mut stub = StubAnalytics::new(HashMap::from([
            (TimeWindow::TwentyFourHours, batch()),
            (TimeWindow::OneHour, vec![reading("W1", 80, 0)]),
        ]));
        stub.held = Some((TimeWindow::TwentyFourHours, Arc::clone(&gate)));
        let monitor = Arc::new(DashboardMonitor::new(Arc::new(stub), TimeWindow::TwentyFourHours));

        let slow = tokio::spawn({
            let monitor = Arc::clone(&monitor);
            async move { monitor.refresh().await }
        });
        for _ in 0..100 {
            if monitor.view().await.fetching {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(monitor.view().await.fetching);

        // A poll while the slow fetch is outstanding is skipped
        assert!(!monitor.refresh().await);

        assert!(monitor.change_window(TimeWindow::OneHour).await);
        gate.notify_one();
        assert!(!slow.await.unwrap());

        let view = monitor.view().await;
        let snapshot = view.state.snapshot().unwrap();
        assert_eq!(snapshot.window, TimeWindow::OneHour);
        assert_eq!(snapshot.stats.total_readings, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_polling_refreshes_on_interval() {
        let stub = Arc::new(StubAnalytics::new(HashMap::from([(TimeWindow::OneHour, batch())])));
        let monitor = Arc::new(DashboardMonitor::new(stub.clone(), TimeWindow::OneHour));

        let handle = Arc::clone(&monitor).spawn_polling(Duration::from_secs(30));
        tokio::time::sleep(Duration::from_secs(65)).await;
        handle.abort();

        assert_eq!(stub.fetches.load(Ordering::SeqCst), 3);
        assert!(monitor.view().await.state.snapshot().is_some());
    }
}
