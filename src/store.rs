// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! In-memory key store with per-entry time-to-live.
//!
//! Probing never extends an entry's lifetime: a key set with a one hour TTL
//! expires one hour after the set, however often it is looked at. Expired
//! entries are invisible to `probe` straight away and are physically removed
//! by `purge_expired`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct LimitEntry {
    expires_at: Instant,
}

impl LimitEntry {
    fn remaining(&self, now: Instant) -> Option<Duration> {
        (now < self.expires_at).then(|| self.expires_at - now)
    }
}

/// Thread-safe TTL store shared between concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct TtlStore {
    entries: Arc<RwLock<HashMap<String, LimitEntry>>>,
}

impl TtlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `key`, expiring `ttl` from now.
    pub async fn set(&self, key: &str, ttl: Duration) {
        let entry = LimitEntry {
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Time left before `key` expires, or `None` if it is absent or expired.
    pub async fn probe(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .get(key)
            .and_then(|entry| entry.remaining(now))
    }

    /// Delete `key`. Removing an absent key is a no-op.
    pub async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.remaining(now).is_some());
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, remaining = entries.len(), "Purged expired rate limit entries");
        }
        purged
    }

    /// Number of physically stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
