//! One tick is fetch, diff, deliver, then persist.
//!
//! Rows are processed strictly in source order. A row is committed to the
//! in-memory tracked set only after its delivery succeeds, so a failed row is
//! retried on the next tick and a duplicate timestamp later in the same fetch
//! is skipped once the first copy is delivered. The set is written back
//! exactly once, after the pass, whatever the outcome of individual rows.

use crate::config::RelayConfig;
use crate::delivery::{Transport, WebhookTransport};
use crate::error::Result;
use crate::fetcher::{fetch_or_empty, ResponseSource, SheetsFetcher};
use crate::tracker::{JsonFileTracker, TrackedSet, TrackerStore};
use crate::types::{DeliveryPayload, FormResponse, TickReport};
use tracing::Instrument;

pub struct Relay<S, D, T> {
    source: S,
    transport: D,
    tracker: T,
}

/// The production wiring: Sheets fetch, webhook delivery, JSON file state.
pub type HttpRelay = Relay<SheetsFetcher, WebhookTransport, JsonFileTracker>;

impl HttpRelay {
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        Ok(Relay::new(
            SheetsFetcher::new(config.http_timeout)?,
            WebhookTransport::new(config.http_timeout)?,
            JsonFileTracker::new(config.state_path.clone()),
        ))
    }
}

impl<S, D, T> Relay<S, D, T>
where
    S: ResponseSource,
    D: Transport,
    T: TrackerStore,
{
    pub fn new(source: S, transport: D, tracker: T) -> Self {
        Self {
            source,
            transport,
            tracker,
        }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Current fetched list. No effect on tracked state.
    pub async fn responses(&self, locator: &str) -> Vec<FormResponse> {
        fetch_or_empty(&self.source, locator).await
    }

    /// Current persisted set, read without side effects. `Ok(None)` means
    /// no tick has written state yet; corrupt state is reported.
    pub fn tracked(&self) -> Result<Option<TrackedSet>> {
        self.tracker.read()
    }

    pub async fn run_tick(&self, locator: &str, target: &str) -> TickReport {
        let tick_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("tick", tick_id = %tick_id);
        self.tick_inner(locator, target).instrument(span).await
    }

    async fn tick_inner(&self, locator: &str, target: &str) -> TickReport {
        let rows = fetch_or_empty(&self.source, locator).await;
        // Tracker I/O stays inline: one small file, read once and written
        // once per tick, and at most one tick runs at a time.
        let mut tracked = self.tracker.load();
        let mut report = TickReport {
            fetched: rows.len(),
            ..TickReport::default()
        };

        for row in &rows {
            if tracked.contains(&row.timestamp) {
                report.skipped += 1;
                continue;
            }

            report.attempted += 1;
            let payload = DeliveryPayload::from(row);
            match self.transport.deliver(target, &payload).await {
                Ok(()) => {
                    tracing::info!(row = %row.timestamp, webhook = %target, "relayed response");
                    tracked.commit(row.timestamp.clone());
                    report.delivered += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        row = %row.timestamp,
                        webhook = %target,
                        error = %e,
                        "delivery failed; will retry next tick"
                    );
                    report.failed += 1;
                }
            }
        }

        match self.tracker.persist(&tracked) {
            Ok(()) => report.persisted = true,
            Err(e) => {
                tracing::error!(error = %e, tracked = tracked.len(), "could not persist tracked state")
            }
        }

        tracing::info!(
            fetched = report.fetched,
            attempted = report.attempted,
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            "tick complete"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    // -- fakes ---------------------------------------------------------------

    #[derive(Default)]
    struct FakeSource {
        rows: Mutex<Option<Vec<FormResponse>>>,
    }

    impl FakeSource {
        fn with(rows: &[(&str, &str)]) -> Self {
            let source = Self::default();
            source.set(rows);
            source
        }

        fn set(&self, rows: &[(&str, &str)]) {
            let rows = rows.iter().map(|(t, f)| FormResponse::new(*t, *f)).collect();
            *self.rows.lock().unwrap() = Some(rows);
        }

        fn fail(&self) {
            *self.rows.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl ResponseSource for FakeSource {
        async fn fetch(&self, locator: &str) -> Result<Vec<FormResponse>> {
            self.rows
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| RelayError::SourceUnavailable {
                    locator: locator.to_string(),
                    reason: "down".into(),
                })
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<String>>,
        failing: Mutex<HashSet<String>>,
    }

    impl FakeTransport {
        fn fail_on(&self, timestamp: &str) {
            self.failing.lock().unwrap().insert(timestamp.to_string());
        }

        fn recover(&self) {
            self.failing.lock().unwrap().clear();
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn deliver(&self, target: &str, payload: &DeliveryPayload) -> Result<()> {
            let failing = self.failing.lock().unwrap();
            if failing.iter().any(|t| payload.message.ends_with(t.as_str())) {
                return Err(RelayError::DeliveryStatus {
                    target: target.to_string(),
                    status: 503,
                });
            }
            self.sent.lock().unwrap().push(payload.message.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryTracker {
        state: Mutex<TrackedSet>,
        persists: Mutex<usize>,
    }

    impl MemoryTracker {
        fn seeded(ids: &[&str]) -> Self {
            let tracker = Self::default();
            *tracker.state.lock().unwrap() = ids.iter().copied().collect();
            tracker
        }

        fn ids(&self) -> Vec<String> {
            self.state.lock().unwrap().iter().map(String::from).collect()
        }

        fn persist_count(&self) -> usize {
            *self.persists.lock().unwrap()
        }
    }

    impl TrackerStore for MemoryTracker {
        fn load(&self) -> TrackedSet {
            self.state.lock().unwrap().clone()
        }

        fn read(&self) -> Result<Option<TrackedSet>> {
            Ok(Some(self.load()))
        }

        fn persist(&self, set: &TrackedSet) -> Result<()> {
            *self.state.lock().unwrap() = set.clone();
            *self.persists.lock().unwrap() += 1;
            Ok(())
        }
    }

    const SOURCE: &str = "http://sheet";
    const TARGET: &str = "http://hook";

    // -- tests ---------------------------------------------------------------

    #[tokio::test]
    async fn new_rows_are_delivered_and_tracked() {
        let relay = Relay::new(
            FakeSource::with(&[("2025-02-22", "old"), ("2025-02-23", "new")]),
            FakeTransport::default(),
            MemoryTracker::seeded(&["2025-02-22"]),
        );

        let report = relay.run_tick(SOURCE, TARGET).await;

        assert_eq!(report.attempted, 1);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(relay.transport.sent().len(), 1);
        assert!(relay.transport.sent()[0].ends_with("2025-02-23"));
        assert_eq!(relay.tracker.ids(), vec!["2025-02-22", "2025-02-23"]);
    }

    #[tokio::test]
    async fn second_tick_on_unchanged_source_delivers_nothing() {
        let relay = Relay::new(
            FakeSource::with(&[("t1", "a"), ("t2", "b")]),
            FakeTransport::default(),
            MemoryTracker::default(),
        );

        let first = relay.run_tick(SOURCE, TARGET).await;
        let second = relay.run_tick(SOURCE, TARGET).await;

        assert_eq!(first.delivered, 2);
        assert_eq!(second.attempted, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(relay.transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn failed_row_is_retried_until_it_succeeds() {
        let relay = Relay::new(
            FakeSource::with(&[("t1", "a"), ("t2", "b"), ("t3", "c")]),
            FakeTransport::default(),
            MemoryTracker::default(),
        );
        relay.transport.fail_on("t2");

        let tick1 = relay.run_tick(SOURCE, TARGET).await;
        assert_eq!(tick1.delivered, 2);
        assert_eq!(tick1.failed, 1);
        assert!(tick1.persisted);
        assert_eq!(relay.tracker.ids(), vec!["t1", "t3"]);

        relay.transport.recover();
        let tick2 = relay.run_tick(SOURCE, TARGET).await;
        assert_eq!(tick2.attempted, 1);
        assert_eq!(tick2.delivered, 1);
        assert_eq!(relay.tracker.ids(), vec!["t1", "t3", "t2"]);

        let tick3 = relay.run_tick(SOURCE, TARGET).await;
        assert_eq!(tick3.attempted, 0);
    }

    #[tokio::test]
    async fn tracked_set_never_shrinks() {
        let relay = Relay::new(
            FakeSource::with(&[("t1", "a")]),
            FakeTransport::default(),
            MemoryTracker::seeded(&["t0"]),
        );
        relay.run_tick(SOURCE, TARGET).await;

        relay.source.set(&[("t2", "b")]);
        relay.transport.fail_on("t2");
        relay.run_tick(SOURCE, TARGET).await;

        assert_eq!(relay.tracker.ids(), vec!["t0", "t1"]);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_tracked_set_unchanged() {
        let source = FakeSource::default();
        source.fail();
        let relay = Relay::new(
            source,
            FakeTransport::default(),
            MemoryTracker::seeded(&["t1", "t2"]),
        );

        let report = relay.run_tick(SOURCE, TARGET).await;

        assert_eq!(report, TickReport { persisted: true, ..TickReport::default() });
        assert_eq!(relay.tracker.ids(), vec!["t1", "t2"]);
        assert!(relay.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn duplicate_timestamp_in_one_fetch_is_delivered_once() {
        let relay = Relay::new(
            FakeSource::with(&[("t1", "first"), ("t1", "second")]),
            FakeTransport::default(),
            MemoryTracker::default(),
        );

        let report = relay.run_tick(SOURCE, TARGET).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(relay.tracker.ids(), vec!["t1"]);
    }

    #[tokio::test]
    async fn persist_happens_once_per_tick() {
        let relay = Relay::new(
            FakeSource::with(&[("t1", "a"), ("t2", "b"), ("t3", "c")]),
            FakeTransport::default(),
            MemoryTracker::default(),
        );
        relay.transport.fail_on("t3");

        relay.run_tick(SOURCE, TARGET).await;
        assert_eq!(relay.tracker.persist_count(), 1);
        relay.run_tick(SOURCE, TARGET).await;
        assert_eq!(relay.tracker.persist_count(), 2);
    }

    #[tokio::test]
    async fn responses_is_a_pure_read() {
        let relay = Relay::new(
            FakeSource::with(&[("t1", "a")]),
            FakeTransport::default(),
            MemoryTracker::default(),
        );

        let rows = relay.responses(SOURCE).await;

        assert_eq!(rows, vec![FormResponse::new("t1", "a")]);
        assert_eq!(relay.tracker.persist_count(), 0);
        assert!(relay.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn end_to_end_over_http_and_file_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut sheet = mockito::Server::new_async().await;
        let _mock = sheet
            .mock("GET", "/values")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "values": [["Timestamp", "Feedback"], ["2025-02-22", "Great Service!"]]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let mut hook = mockito::Server::new_async().await;
        let delivered = hook
            .mock("POST", "/hook")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let config = RelayConfig::new(
            &crate::config::SourceSettings {
                source_url: Some(format!("{}/values", sheet.url())),
                ..Default::default()
            },
            Some(&format!("{}/hook", hook.url())),
            Some(dir.path().join("state.json")),
            Some(5),
        )
        .unwrap();
        let relay = HttpRelay::from_config(&config).unwrap();

        let first = relay.run_tick(&config.source_url, &config.webhook_url).await;
        let second = relay.run_tick(&config.source_url, &config.webhook_url).await;

        assert_eq!(first.delivered, 1);
        assert_eq!(second.delivered, 0);
        delivered.assert_async().await;
        let tracked = relay.tracked().unwrap().unwrap();
        assert_eq!(tracked.iter().collect::<Vec<_>>(), vec!["2025-02-22"]);
    }

    fn file_relay(state_path: std::path::PathBuf) -> Relay<FakeSource, FakeTransport, JsonFileTracker> {
        Relay::new(
            FakeSource::with(&[("t1", "a")]),
            FakeTransport::default(),
            JsonFileTracker::new(state_path),
        )
    }

    #[test]
    fn tracked_does_not_create_missing_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let relay = file_relay(path.clone());

        assert!(relay.tracked().unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn tracked_reports_corrupt_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{corrupt").unwrap();
        let relay = file_relay(path.clone());

        assert!(matches!(relay.tracked(), Err(RelayError::StateCorrupt { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{corrupt");
    }

    #[tokio::test]
    async fn persist_failure_is_reported_and_tick_completes() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory where the state file should be: reads and writes fail.
        let relay = file_relay(dir.path().to_path_buf());

        let report = relay.run_tick(SOURCE, TARGET).await;

        assert_eq!(report.delivered, 1);
        assert!(!report.persisted);
        assert_eq!(relay.transport.sent().len(), 1);
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn hung_webhook_times_out_and_row_stays_untracked() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepting = tokio::spawn(async move {
            let mut held = Vec::new();
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                held.push(socket);
            }
        });

        let relay = Relay::new(
            FakeSource::with(&[("t1", "a")]),
            crate::delivery::WebhookTransport::new(std::time::Duration::from_secs(1)).unwrap(),
            MemoryTracker::default(),
        );

        let started = std::time::Instant::now();
        let report = relay.run_tick(SOURCE, &format!("http://{addr}/hook")).await;
        accepting.abort();

        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        assert_eq!(report.attempted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 0);
        assert!(report.persisted);
        assert!(relay.tracker.ids().is_empty());
    }
}
