// Credential cache: holds the provider bearer token and refreshes it lazily on expiry

use crate::clock::Clock;
use crate::error::{ErrorKind, GatewayError};
use crate::upstream::UpstreamClient;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// Keeps the bearer token out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Credential {
    // Strict comparison: a token is dead at its expiry instant
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Default)]
struct CredentialCounters {
    hit_count: AtomicUsize,
    refresh_count: AtomicUsize,
    failure_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CredentialStats {
    pub hit_count: usize,
    pub refresh_count: usize,
    pub failure_count: usize,
}

/// Owns the single cached credential slot.
///
/// The slot lock is held across the token exchange, so callers that find the
/// token expired at the same moment wait for one refresh instead of each
/// issuing their own.
pub struct CredentialCache {
    upstream: Arc<dyn UpstreamClient>,
    credentials: ClientCredentials,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<Credential>>,
    counters: CredentialCounters,
}

impl CredentialCache {
    pub fn new(
        upstream: Arc<dyn UpstreamClient>,
        credentials: ClientCredentials,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            upstream,
            credentials,
            clock,
            slot: Mutex::new(None),
            counters: CredentialCounters::default(),
        }
    }

    pub async fn get_valid_credential(&self) -> Result<Credential, GatewayError> {
        let mut slot = self.slot.lock().await;

        if let Some(credential) = slot.as_ref() {
            if credential.is_usable_at(self.clock.now()) {
                self.counters.hit_count.fetch_add(1, Ordering::SeqCst);
                debug!("Using cached access token");
                return Ok(credential.clone());
            }
        }

        info!("Requesting new access token");
        let exchange = self
            .upstream
            .exchange_token(&self.credentials.client_id, &self.credentials.client_secret)
            .await;

        match exchange {
            Ok(grant) => {
                let now = self.clock.now();
                let ttl = Duration::try_seconds(grant.expires_in).unwrap_or_else(Duration::zero);
                let credential = Credential {
                    token: grant.access_token,
                    expires_at: now.checked_add_signed(ttl).unwrap_or(now),
                };
                *slot = Some(credential.clone());
                self.counters.refresh_count.fetch_add(1, Ordering::SeqCst);
                info!(expires_at = %credential.expires_at, "Access token obtained successfully");
                Ok(credential)
            }
            Err(err) => {
                // A failed exchange leaves the cache empty
                *slot = None;
                self.counters.failure_count.fetch_add(1, Ordering::SeqCst);
                error!(detail = %err.detail, "Token exchange failed");
                Err(err.with_kind(ErrorKind::AuthFailure))
            }
        }
    }

    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    pub async fn current(&self) -> Option<Credential> {
        self.slot.lock().await.clone()
    }

    pub fn stats(&self) -> CredentialStats {
        CredentialStats {
            hit_count: self.counters.hit_count.load(Ordering::SeqCst),
            refresh_count: self.counters.refresh_count.load(Ordering::SeqCst),
            failure_count: self.counters.failure_count.load(Ordering::SeqCst),
        }
    }
}
