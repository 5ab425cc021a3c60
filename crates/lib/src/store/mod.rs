//! Backing stores for bindings.
//!
//! A store holds three isolated namespaces, the areas `sync`, `local`, and
//! `managed`. Each namespace is a flat mapping from top-level keys to JSON
//! values; nesting below a key is opaque to the store. Writes merge at the
//! top level only, so a `set` replaces the whole value under each written key
//! while leaving other keys alone.
//!
//! The `managed` area is provisioned out of band and is read-only through
//! this interface: `set`, `remove`, and `clear` against it fail. The `sync`
//! and `local` areas accept an optional per-area byte quota; a write that
//! would exceed it fails and leaves the namespace unchanged.
//!
//! # Submodules
//!
//! - [`memory`] - in-process store for tests and embedding
//! - [`file`] - one JSON document per area under a base directory

pub mod file;
pub mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use std::io;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// One namespace's entries: top-level keys mapped to arbitrary JSON values.
pub type Entries = Map<String, Value>;

/// The three isolated namespaces of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageArea {
  Sync,
  #[default]
  Local,
  Managed,
}

impl StorageArea {
  /// The lowercase selector string for this area.
  pub fn as_str(self) -> &'static str {
    match self {
      StorageArea::Sync => "sync",
      StorageArea::Local => "local",
      StorageArea::Managed => "managed",
    }
  }
}

impl std::fmt::Display for StorageArea {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Error for a storage area selector that names no known area.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown storage area '{0}' (expected sync, local, or managed)")]
pub struct UnknownAreaError(pub String);

impl FromStr for StorageArea {
  type Err = UnknownAreaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "sync" => Ok(StorageArea::Sync),
      "local" => Ok(StorageArea::Local),
      "managed" => Ok(StorageArea::Managed),
      _ => Err(UnknownAreaError(s.to_string())),
    }
  }
}

/// What a `get` should fetch from a namespace.
#[derive(Debug, Clone, PartialEq)]
pub enum GetQuery {
  /// Every entry in the namespace.
  All,

  /// The listed keys; absent keys are simply missing from the result.
  Keys(Vec<String>),

  /// The mapped keys; an absent key's value is filled from its default, so
  /// every queried key is present in the result.
  Defaults(Entries),
}

/// Errors reported by a backing store.
#[derive(Debug, Error)]
pub enum BackendError {
  #[error("failed to read store file: {0}")]
  Read(#[source] io::Error),

  #[error("failed to write store file: {0}")]
  Write(#[source] io::Error),

  #[error("failed to create store directory: {0}")]
  CreateDir(#[source] io::Error),

  #[error("failed to parse store file: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("failed to serialize store entries: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("the managed storage area is read-only")]
  ReadOnlyArea,

  #[error("quota exceeded: {used} of {quota} bytes in use")]
  QuotaExceeded { used: u64, quota: u64 },
}

/// An asynchronous, namespaced key-value store.
///
/// All operations address one area at a time and complete with a delivered
/// result, never a panic. Implementations serialize access to their own
/// namespaces internally; callers racing on the same area get whichever
/// completion lands last.
#[async_trait]
pub trait StorageBackend: Send + Sync {
  /// Fetch entries from `area` according to `query`.
  async fn get(&self, area: StorageArea, query: &GetQuery) -> Result<Entries, BackendError>;

  /// Merge `entries` into `area` at the top level.
  async fn set(&self, area: StorageArea, entries: Entries) -> Result<(), BackendError>;

  /// Remove the listed keys from `area`; missing keys are tolerated.
  async fn remove(&self, area: StorageArea, keys: &[String]) -> Result<(), BackendError>;

  /// Drop every entry in `area`.
  async fn clear(&self, area: StorageArea) -> Result<(), BackendError>;

  /// Bytes used by the listed keys, or by the whole namespace for `None`.
  async fn bytes_in_use(&self, area: StorageArea, keys: Option<&[String]>) -> Result<u64, BackendError>;
}

/// Resolve `query` against one namespace's entries.
pub(crate) fn resolve_query(entries: &Entries, query: &GetQuery) -> Entries {
  match query {
    GetQuery::All => entries.clone(),
    GetQuery::Keys(keys) => {
      let mut result = Entries::new();
      for key in keys {
        if let Some(value) = entries.get(key) {
          result.insert(key.clone(), value.clone());
        }
      }
      result
    }
    GetQuery::Defaults(defaults) => {
      let mut result = Entries::new();
      for (key, default) in defaults {
        let value = entries.get(key).unwrap_or(default);
        result.insert(key.clone(), value.clone());
      }
      result
    }
  }
}

/// Bytes one entry occupies: key length plus JSON-serialized value length.
pub(crate) fn entry_bytes(key: &str, value: &Value) -> u64 {
  let value_len = serde_json::to_string(value).map_or(0, |s| s.len());
  (key.len() + value_len) as u64
}

/// Bytes used by the listed keys, or by every entry for `None`.
///
/// An empty key list measures 0; missing keys contribute nothing.
pub(crate) fn measure(entries: &Entries, keys: Option<&[String]>) -> u64 {
  match keys {
    None => entries.iter().map(|(key, value)| entry_bytes(key, value)).sum(),
    Some(keys) => keys
      .iter()
      .filter_map(|key| entries.get(key).map(|value| entry_bytes(key, value)))
      .sum(),
  }
}

/// Refuse writes against the read-only `managed` area.
pub(crate) fn check_writable(area: StorageArea) -> Result<(), BackendError> {
  if area == StorageArea::Managed {
    return Err(BackendError::ReadOnlyArea);
  }
  Ok(())
}

/// Refuse a mutation whose resulting namespace would exceed `quota`.
pub(crate) fn check_quota(entries: &Entries, quota: Option<u64>) -> Result<(), BackendError> {
  let Some(quota) = quota else {
    return Ok(());
  };
  let used = measure(entries, None);
  if used > quota {
    return Err(BackendError::QuotaExceeded { used, quota });
  }
  Ok(())
}
