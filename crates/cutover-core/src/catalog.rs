//! Catalog of selectable values
//!
//! External mapping of human-readable labels to underlying values,
//! refreshed out-of-band from a remote JSON document shaped as
//! `{ "<key>": { "label": ..., "value": ..., "image": ... } }`.
//!
//! The store holds an immutable snapshot behind an atomically replaced
//! shared reference: readers always see a complete, consistent catalog
//! version, never a partially updated one. A failed refresh keeps the
//! previous snapshot in place.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// One selectable catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Human-readable label shown to the operator
    pub label: String,
    /// Underlying value written into the artifact
    pub value: String,
    /// Optional image reference for display
    #[serde(default)]
    pub image: Option<String>,
}

/// Ordered mapping of catalog keys to entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from `(key, entry)` pairs
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, CatalogEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up an entry by catalog key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.get(key)
    }

    /// Reverse lookup: the label whose entry carries `value`
    ///
    /// Used to display the friendly name of the currently active value.
    #[must_use]
    pub fn label_for_value(&self, value: &str) -> Option<&str> {
        self.entries
            .values()
            .find(|entry| entry.value == value)
            .map(|entry| entry.label.as_str())
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CatalogEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Atomically swapped catalog snapshot store
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Arc<Catalog>>,
}

impl CatalogStore {
    /// Create a store holding an empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current snapshot
    ///
    /// The returned `Arc` stays internally consistent even while a refresh
    /// replaces the store's snapshot underneath.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read())
    }

    /// Replace the snapshot wholesale
    pub fn replace(&self, catalog: Catalog) {
        *self.current.write() = Arc::new(catalog);
    }
}

/// Catalog fetch error
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog request or decode failed
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Source of catalog snapshots
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch a complete catalog
    ///
    /// # Errors
    /// Returns `CatalogError` when the fetch or decode fails.
    async fn fetch(&self) -> Result<Catalog, CatalogError>;
}

/// HTTP-backed catalog source
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpCatalogSource {
    /// Create a source fetching `url` with a bounded per-request timeout
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let catalog: Catalog = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::info!(entries = catalog.len(), url = %self.url, "catalog fetched");
        Ok(catalog)
    }
}

/// Spawn the periodic refresh task
///
/// Ticks immediately, then every `interval`. A successful fetch replaces
/// the snapshot wholesale; a failed fetch keeps the previous snapshot and
/// logs a warning.
pub fn spawn_refresher(
    store: Arc<CatalogStore>,
    source: Arc<dyn CatalogSource>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match source.fetch().await {
                Ok(catalog) => {
                    tracing::info!(entries = catalog.len(), "catalog snapshot replaced");
                    store.replace(catalog);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "catalog refresh failed, keeping previous snapshot");
                }
            }
        }
    })
}
