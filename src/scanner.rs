use std::sync::Arc;
use std::time::Duration;

use ::time::OffsetDateTime;
use log::{debug, info, warn};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::classify::{classify, Classified};
use crate::codes;
use crate::fetch::Fetcher;
use crate::hub::{BroadcastHub, Subscription};
use crate::types::{Category, ProgressEvent, ScanSnapshot};

pub const DEFAULT_BASE_URL: &str = "https://kopipe.net/up/";
pub const DEFAULT_PACE: Duration = Duration::from_millis(100);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Prefix each code is appended to.
    pub base_url: String,
    /// Pause after every code, whatever the fetch took.
    pub pace: Duration,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pace: DEFAULT_PACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("a scan pass is already running")]
    AlreadyRunning,
}

/// Snapshot store shared by the scan loop and the query handlers.
///
/// Only [`Scanner::run_scan`] writes `current` and `finished`; the `running`
/// flag is claimed under the write lock so at most one pass exists at a time.
#[derive(Debug, Default)]
struct ScanState {
    running: bool,
    first_pass_done: bool,
    current: Option<ScanSnapshot>,
    finished: Option<Arc<ScanSnapshot>>,
}

/// Drives generate -> fetch -> classify -> accumulate passes and owns the snapshots.
#[derive(Clone)]
pub struct Scanner {
    fetcher: Arc<dyn Fetcher>,
    hub: BroadcastHub,
    settings: Arc<ScanSettings>,
    inner: Arc<RwLock<ScanState>>,
}

impl Scanner {
    pub fn new(fetcher: Arc<dyn Fetcher>, hub: BroadcastHub, settings: ScanSettings) -> Self {
        Self {
            fetcher,
            hub,
            settings: Arc::new(settings),
            inner: Arc::new(RwLock::new(ScanState::default())),
        }
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub async fn is_running(&self) -> bool {
        self.inner.read().await.running
    }

    pub async fn first_pass_done(&self) -> bool {
        self.inner.read().await.first_pass_done
    }

    /// Last completed pass, if any.
    pub async fn finished(&self) -> Option<Arc<ScanSnapshot>> {
        self.inner.read().await.finished.clone()
    }

    /// Copy of the pass currently being built.
    pub async fn current(&self) -> Option<ScanSnapshot> {
        self.inner.read().await.current.clone()
    }

    /// Register a live-progress listener and return the event it should see first.
    ///
    /// Registration happens under the state lock, so no progress event can be
    /// published between computing the greeting and joining the hub.
    pub async fn connect_progress(&self) -> (String, Subscription) {
        let state = self.inner.read().await;
        let subscription = self.hub.connect();
        let event = match (&state.finished, state.running, state.first_pass_done) {
            (_, true, false) => ProgressEvent::live_started(),
            (Some(finished), _, _) => ProgressEvent::finished(finished),
            (None, _, _) => ProgressEvent::idle(),
        };
        let json = event.to_json().unwrap_or_else(|e| {
            warn!("failed to serialize greeting: {e}");
            String::from("{}")
        });
        (json, subscription)
    }

    /// Run one full pass over the code space.
    ///
    /// Returns [`ScanError::AlreadyRunning`] without side effects if another
    /// pass holds the running flag.
    pub async fn run_scan(&self) -> Result<Arc<ScanSnapshot>, ScanError> {
        {
            let mut state = self.inner.write().await;
            if state.running {
                return Err(ScanError::AlreadyRunning);
            }
            state.running = true;
            state.current = Some(ScanSnapshot::new());
        }

        let codes = codes::generate();
        info!("Scanning {} kopipe codes", codes.len());

        for code in &codes {
            let url = format!("{}{}", self.settings.base_url, code);
            let outcome = self.fetcher.fetch(&url).await;
            if let Err(e) = &outcome {
                debug!("{url}: fetch failed: {e}");
            }
            let Classified { category, record } = classify(code, &url, &outcome);

            {
                let mut state = self.inner.write().await;
                let live = !state.first_pass_done;
                let current = state.current.get_or_insert_with(ScanSnapshot::new);
                current.push(category, record);
                // Later passes stay silent; listeners get the finished snapshot instead.
                if live {
                    self.hub.publish(&ProgressEvent::live(current));
                }
            }

            if !self.settings.pace.is_zero() {
                time::sleep(self.settings.pace).await;
            }
        }

        let finished = {
            let mut state = self.inner.write().await;
            let mut snapshot = state.current.take().unwrap_or_default();
            snapshot.timestamp = Some(now_millis());
            let snapshot = Arc::new(snapshot);
            state.finished = Some(snapshot.clone());
            state.running = false;
            state.first_pass_done = true;
            snapshot
        };

        self.hub.publish(&ProgressEvent::done());
        info!(
            "Scan finished: {} scanned, {} success, {} filtered, {} fail, {} locked, {} images",
            finished.scanned,
            finished.count(Category::Success),
            finished.count(Category::Filtered),
            finished.count(Category::Fail),
            finished.count(Category::Locked),
            finished.count(Category::Images),
        );
        Ok(finished)
    }
}

/// Run a pass immediately and then every `every`, skipping ticks while a pass is active.
pub fn spawn_scheduler(scanner: Scanner, every: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(every.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if scanner.is_running().await {
                debug!("scan still running, skipping trigger");
                continue;
            }
            let scanner = scanner.clone();
            tokio::spawn(async move {
                if let Err(e) = scanner.run_scan().await {
                    debug!("scan trigger ignored: {e}");
                }
            });
        }
    })
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}
