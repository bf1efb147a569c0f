#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kopipe_scan::fetch::{FetchError, FetchOutcome, FetchResponse, Fetcher};
use kopipe_scan::hub::BroadcastHub;
use kopipe_scan::scanner::{ScanSettings, Scanner};
use tokio::sync::Notify;

pub const BASE_URL: &str = "http://upstream.test/up/";

/// In-memory upstream: scripted replies per code, 404 for everything else.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: HashMap<String, FetchOutcome>,
    calls: Mutex<Vec<String>>,
    gate: Mutex<Option<Gate>>,
}

/// Holds the next fetch until released.
#[derive(Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, code: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert(code.to_string(), Ok(FetchResponse::new(status, body)));
        self
    }

    pub fn fail(mut self, code: &str, detail: &str) -> Self {
        self.replies
            .insert(code.to_string(), Err(FetchError(detail.to_string())));
        self
    }

    /// Arm a gate that blocks the next fetch call.
    pub fn arm_gate(&self) -> Gate {
        let gate = Gate::default();
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        let code = url.strip_prefix(BASE_URL).unwrap_or(url).to_string();
        self.calls.lock().unwrap().push(code.clone());

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        self.replies
            .get(&code)
            .cloned()
            .unwrap_or(Ok(FetchResponse::status_only(404)))
    }
}

pub fn scanner_with(fetcher: Arc<ScriptedFetcher>) -> Scanner {
    scanner_with_hub(fetcher, BroadcastHub::new())
}

pub fn scanner_with_hub(fetcher: Arc<ScriptedFetcher>, hub: BroadcastHub) -> Scanner {
    paced_scanner(fetcher, hub, Duration::ZERO)
}

pub fn paced_scanner(fetcher: Arc<ScriptedFetcher>, hub: BroadcastHub, pace: Duration) -> Scanner {
    Scanner::new(
        fetcher,
        hub,
        ScanSettings {
            base_url: BASE_URL.to_string(),
            pace,
        },
    )
}

pub fn sample_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::new()
        .reply("44a", 200, "<title>notes.txt Download</title>")
        .reply(
            "44b",
            200,
            r#"<title>cat.png Download</title><img src="https://pc286.kopipe.net/u/cat.png">"#,
        )
        .reply(
            "42",
            200,
            r#"<title>secret.zip Download</title><img src="//static-up.kopipe.net/locked.png">"#,
        )
        .reply("3aa", 200, "<title>Kopipe Error</title>")
        .reply("420", 503, "")
        .fail("460", "connection refused")
}
