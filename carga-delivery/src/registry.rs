//! Revocable object URLs.
//!
//! Every artifact handed to a host is registered under a `blob:carga/<uuid>`
//! URL. URLs must be revoked once the artifact has been consumed; the registry
//! keeps counts so leaks are observable.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use carga_renderer::Artifact;
use tokio::task::JoinHandle;
use tokio::time::Instant;

const URL_PREFIX: &str = "blob:carga/";

/// An opaque URL referring to a registered artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    /// URL text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn for_tests(url: &str) -> Self {
        Self(url.to_string())
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct Entry {
    artifact: Arc<Artifact>,
    created_at: Instant,
}

/// Thread-safe table of live object URLs.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrlRegistry {
    entries: Arc<RwLock<HashMap<ObjectUrl, Entry>>>,
    created: Arc<AtomicU64>,
    revoked: Arc<AtomicU64>,
}

impl ObjectUrlRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact and return its URL.
    pub fn create(&self, artifact: Artifact) -> ObjectUrl {
        let url = ObjectUrl(format!("{URL_PREFIX}{}", uuid::Uuid::new_v4()));
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            url.clone(),
            Entry {
                artifact: Arc::new(artifact),
                created_at: Instant::now(),
            },
        );
        self.created.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(url = %url, live = entries.len(), "Object URL created");
        url
    }

    /// Look up the artifact behind a live URL.
    #[must_use]
    pub fn resolve(&self, url: &ObjectUrl) -> Option<Arc<Artifact>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        entries.get(url).map(|e| Arc::clone(&e.artifact))
    }

    /// Revoke a URL. Returns `false` if it was not live.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(url)
            .is_some();
        if removed {
            self.revoked.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(url = %url, "Object URL revoked");
        }
        removed
    }

    /// Revoke a URL once `delay` has elapsed.
    pub fn revoke_after(&self, url: ObjectUrl, delay: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            registry.revoke(&url);
        })
    }

    /// Number of URLs not yet revoked.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total URLs created and revoked since the registry was built.
    #[must_use]
    pub fn totals(&self) -> (u64, u64) {
        (
            self.created.load(Ordering::Relaxed),
            self.revoked.load(Ordering::Relaxed),
        )
    }

    /// Revoke every URL older than `max_age`. Returns how many were revoked.
    pub fn sweep_older_than(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, e| now.duration_since(e.created_at) < max_age);
        let swept = before - entries.len();
        if swept > 0 {
            self.revoked
                .fetch_add(u64::try_from(swept).unwrap_or(u64::MAX), Ordering::Relaxed);
            tracing::warn!(swept, "Swept stale object URLs");
        }
        swept
    }
}
