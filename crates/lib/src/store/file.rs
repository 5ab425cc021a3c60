//! File-backed store.
//!
//! Persists each area as one JSON document under a base directory. A missing
//! file is an empty namespace; a corrupt file is an error, not data loss.
//!
//! # Storage Layout
//!
//! ```text
//! {base_dir}/
//! ├── sync.json       # entries of the sync area
//! ├── local.json      # entries of the local area
//! └── managed.json    # provisioned externally, never written here
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
  BackendError, Entries, GetQuery, StorageArea, StorageBackend, check_quota, check_writable, measure, resolve_query,
};

/// Store persisted as one JSON document per area.
///
/// Writes are atomic (write to temp, then rename) and read-modify-write
/// cycles are serialized per instance. Two instances over the same directory
/// race like any two independent store clients.
#[derive(Debug)]
pub struct FileBackend {
  base_dir: PathBuf,
  quota: Option<u64>,
  write_lock: Mutex<()>,
}

impl FileBackend {
  /// A store rooted at `base_dir` with no quota.
  ///
  /// The directory is created on first write, not here.
  pub fn new(base_dir: impl Into<PathBuf>) -> Self {
    Self {
      base_dir: base_dir.into(),
      quota: None,
      write_lock: Mutex::new(()),
    }
  }

  /// A store rooted at `base_dir`, limited to `quota` bytes per writable area.
  pub fn with_quota(base_dir: impl Into<PathBuf>, quota: u64) -> Self {
    Self {
      base_dir: base_dir.into(),
      quota: Some(quota),
      write_lock: Mutex::new(()),
    }
  }

  /// The directory holding the area files.
  pub fn base_dir(&self) -> &Path {
    &self.base_dir
  }

  /// Path of the JSON document backing `area`.
  fn area_path(&self, area: StorageArea) -> PathBuf {
    self.base_dir.join(format!("{}.json", area.as_str()))
  }

  /// Load one area's entries.
  ///
  /// A missing file is an empty namespace.
  async fn load_area(&self, area: StorageArea) -> Result<Entries, BackendError> {
    let path = self.area_path(area);

    let content = match fs::read_to_string(&path).await {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
      Err(e) => return Err(BackendError::Read(e)),
    };

    serde_json::from_str(&content).map_err(BackendError::Parse)
  }

  /// Persist one area's entries atomically.
  async fn save_area(&self, area: StorageArea, entries: &Entries) -> Result<(), BackendError> {
    fs::create_dir_all(&self.base_dir).await.map_err(BackendError::CreateDir)?;

    let path = self.area_path(area);
    let temp_path = self.base_dir.join(format!("{}.json.tmp", area.as_str()));

    let content = serde_json::to_string_pretty(entries).map_err(BackendError::Serialize)?;
    fs::write(&temp_path, &content).await.map_err(BackendError::Write)?;
    fs::rename(&temp_path, &path).await.map_err(BackendError::Write)?;

    debug!(area = %area, count = entries.len(), "persisted store area");
    Ok(())
  }
}

#[async_trait]
impl StorageBackend for FileBackend {
  async fn get(&self, area: StorageArea, query: &GetQuery) -> Result<Entries, BackendError> {
    let entries = self.load_area(area).await?;
    Ok(resolve_query(&entries, query))
  }

  async fn set(&self, area: StorageArea, entries: Entries) -> Result<(), BackendError> {
    check_writable(area)?;
    let _guard = self.write_lock.lock().await;

    let mut merged = self.load_area(area).await?;
    merged.extend(entries);
    check_quota(&merged, self.quota)?;

    self.save_area(area, &merged).await
  }

  async fn remove(&self, area: StorageArea, keys: &[String]) -> Result<(), BackendError> {
    check_writable(area)?;
    let _guard = self.write_lock.lock().await;

    let mut entries = self.load_area(area).await?;
    for key in keys {
      entries.remove(key);
    }

    self.save_area(area, &entries).await
  }

  async fn clear(&self, area: StorageArea) -> Result<(), BackendError> {
    check_writable(area)?;
    let _guard = self.write_lock.lock().await;

    // Dropping the file is the wipe; a namespace that never existed is fine
    match fs::remove_file(self.area_path(area)).await {
      Ok(()) => {
        debug!(area = %area, "cleared store area");
        Ok(())
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(BackendError::Write(e)),
    }
  }

  async fn bytes_in_use(&self, area: StorageArea, keys: Option<&[String]>) -> Result<u64, BackendError> {
    let entries = self.load_area(area).await?;
    Ok(measure(&entries, keys))
  }
}
