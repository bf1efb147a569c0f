use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};
use serde::Serialize;
use tokio::sync::mpsc::{self, Receiver, Sender};

pub type SubscriberId = u64;

/// Events buffered per subscriber before further pushes to it are dropped.
pub const DEFAULT_CAPACITY: usize = 64;

/// Registry of live-progress listeners.
///
/// Each subscriber is a bounded channel of serialized events, so a single
/// subscriber sees events in publish order. A push to a full or closed channel
/// is dropped; entries are only removed through [`BroadcastHub::unsubscribe`].
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    capacity: usize,
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<SubscriberId, Sender<String>>>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                capacity: capacity.max(1),
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<SubscriberId, Sender<String>>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, handle: Sender<String>) -> SubscriberId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry().insert(id, handle);
        debug!("subscriber {id} connected");
        id
    }

    /// Removes the subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.registry().remove(&id).is_some() {
            debug!("subscriber {id} disconnected");
        }
    }

    /// Open a channel and register it; dropping the returned [`Subscription`] unsubscribes.
    pub fn connect(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        let id = self.subscribe(tx);
        Subscription {
            id,
            rx,
            hub: self.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    /// Serialize `event` once and push it to every registered subscriber.
    /// Returns how many subscribers accepted it.
    pub fn publish<T: Serialize + ?Sized>(&self, event: &T) -> usize {
        let handles = self.handles();
        if handles.is_empty() {
            return 0;
        }
        match serde_json::to_string(event) {
            Ok(json) => deliver(&handles, json),
            Err(e) => {
                warn!("failed to serialize event: {e}");
                0
            }
        }
    }

    pub fn publish_json(&self, json: String) -> usize {
        deliver(&self.handles(), json)
    }

    // Copy of the registry so sends happen without holding the lock.
    fn handles(&self) -> Vec<Sender<String>> {
        self.registry().values().cloned().collect()
    }
}

fn deliver(handles: &[Sender<String>], json: String) -> usize {
    handles
        .iter()
        .filter(|tx| tx.try_send(json.clone()).is_ok())
        .count()
}

/// Receiving end of one subscriber.
pub struct Subscription {
    id: SubscriberId,
    rx: Receiver<String>,
    hub: BroadcastHub,
}

impl Subscription {
    /// Waits for the next serialized event.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
