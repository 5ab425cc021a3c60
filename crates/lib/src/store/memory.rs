//! In-process store backend.
//!
//! Keeps the three namespaces in a map behind a `tokio` read/write lock.
//! Used by tests throughout the crate and suitable for embedding when no
//! persistence is wanted.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
  BackendError, Entries, GetQuery, StorageArea, StorageBackend, check_quota, check_writable, measure, resolve_query,
};

/// In-memory namespaced key-value store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
  areas: RwLock<HashMap<StorageArea, Entries>>,
  quota: Option<u64>,
}

impl MemoryBackend {
  /// An empty store with no quota.
  pub fn new() -> Self {
    Self::default()
  }

  /// An empty store limited to `quota` bytes per writable area.
  pub fn with_quota(quota: u64) -> Self {
    Self {
      areas: RwLock::new(HashMap::new()),
      quota: Some(quota),
    }
  }

  /// Seed `area` with entries, bypassing the read-only and quota checks.
  ///
  /// This is how `managed` data gets provisioned.
  pub async fn seed(&self, area: StorageArea, entries: Entries) {
    let mut areas = self.areas.write().await;
    areas.entry(area).or_default().extend(entries);
  }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
  async fn get(&self, area: StorageArea, query: &GetQuery) -> Result<Entries, BackendError> {
    let areas = self.areas.read().await;
    let empty = Entries::new();
    let entries = areas.get(&area).unwrap_or(&empty);
    Ok(resolve_query(entries, query))
  }

  async fn set(&self, area: StorageArea, entries: Entries) -> Result<(), BackendError> {
    check_writable(area)?;

    let mut areas = self.areas.write().await;
    let namespace = areas.entry(area).or_default();

    // Merge into a copy first so a quota failure leaves the namespace alone
    let mut merged = namespace.clone();
    merged.extend(entries);
    check_quota(&merged, self.quota)?;

    *namespace = merged;
    Ok(())
  }

  async fn remove(&self, area: StorageArea, keys: &[String]) -> Result<(), BackendError> {
    check_writable(area)?;

    let mut areas = self.areas.write().await;
    if let Some(namespace) = areas.get_mut(&area) {
      for key in keys {
        namespace.remove(key);
      }
    }
    Ok(())
  }

  async fn clear(&self, area: StorageArea) -> Result<(), BackendError> {
    check_writable(area)?;

    let mut areas = self.areas.write().await;
    areas.remove(&area);
    Ok(())
  }

  async fn bytes_in_use(&self, area: StorageArea, keys: Option<&[String]>) -> Result<u64, BackendError> {
    let areas = self.areas.read().await;
    let empty = Entries::new();
    let entries = areas.get(&area).unwrap_or(&empty);
    Ok(measure(entries, keys))
  }
}
