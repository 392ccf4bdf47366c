use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Key-value store the client keeps tokens in.
///
/// The store is injected and externally owned; the client only reads,
/// writes with a TTL, and deletes. Expired entries must behave as absent.
/// A cache hit is trusted blindly, there is no server-side revocation
/// check.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn put(&self, key: &str, value: &str, ttl: Duration);
    /// Returns whether the key was present.
    async fn delete(&self, key: &str) -> bool;
}

/// Cache key for the machine-to-machine access token.
pub fn client_token_key(app_id: &str) -> String {
    format!("{app_id}_client_access_token")
}

/// Cache key for the end-user access token.
pub fn user_token_key(app_id: &str) -> String {
    format!("{app_id}_user_access_token")
}

/// Cache key for the end-user refresh token.
pub fn user_refresh_key(app_id: &str) -> String {
    format!("{app_id}_user_refresh_token")
}

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// In-process [`TokenStore`] with per-entry TTL, checked on read.
///
/// Suitable default for single-process deployments; swap in a Redis-backed
/// implementation of the trait when tokens must be shared across processes.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
    }

    async fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key).is_some()
    }
}
