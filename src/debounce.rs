// Search-as-you-type: debounced airport keyword lookups

use crate::client::{ClientError, GatewayClient};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

// Stricter than the gateway floor; avoids noisy suggestion lists.
// Counted in UTF-16 code units, like the gateway's.
pub const MIN_SUGGESTION_KEYWORD_LENGTH: usize = 3;

#[async_trait]
pub trait AirportLookup: Send + Sync + 'static {
    async fn lookup(&self, keyword: &str) -> Result<Vec<Value>, ClientError>;
}

#[async_trait]
impl AirportLookup for GatewayClient {
    async fn lookup(&self, keyword: &str) -> Result<Vec<Value>, ClientError> {
        self.search_airports(keyword).await
    }
}

/// Schedules at most one delayed lookup. Every `update` cancels the pending
/// delay, so only the keyword typed last is looked up, once the caller has
/// been idle for the configured delay. Suggestions are published on a watch
/// channel.
///
/// A lookup that has already started runs to completion in its own task. Its
/// result is only published if no newer `update` or `cancel` happened since it
/// was scheduled.
pub struct KeywordDebouncer {
    lookup: Arc<dyn AirportLookup>,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    generation: Arc<AtomicU64>,
    suggestions: Arc<watch::Sender<Vec<Value>>>,
}

impl KeywordDebouncer {
    pub fn new(lookup: Arc<dyn AirportLookup>) -> Self {
        Self::with_delay(lookup, DEBOUNCE_DELAY)
    }

    pub fn with_delay(lookup: Arc<dyn AirportLookup>, delay: Duration) -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            lookup,
            delay,
            pending: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
            suggestions: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Value>> {
        self.suggestions.subscribe()
    }

    // Must be called from within a tokio runtime
    pub fn update(&self, keyword: impl Into<String>) {
        let keyword: String = keyword.into();
        let lookup = Arc::clone(&self.lookup);
        let suggestions = Arc::clone(&self.suggestions);
        let delay = self.delay;

        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let latest = Arc::clone(&self.generation);
        let generation = latest.fetch_add(1, Ordering::SeqCst) + 1;
        let publish = move |results: Vec<Value>| {
            if latest.load(Ordering::SeqCst) == generation {
                suggestions.send_replace(results);
            } else {
                debug!("Dropping stale suggestions");
            }
        };

        // Aborting this handle only ever interrupts the sleep
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if keyword.encode_utf16().count() < MIN_SUGGESTION_KEYWORD_LENGTH {
                publish(Vec::new());
                return;
            }

            tokio::spawn(async move {
                debug!("Searching for: {keyword}");
                match lookup.lookup(&keyword).await {
                    Ok(results) => {
                        debug!("Results: {}", results.len());
                        publish(results);
                    }
                    Err(e) => {
                        warn!("Error searching airports: {e}");
                        publish(Vec::new());
                    }
                }
            });
        }));
    }

    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for KeywordDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
