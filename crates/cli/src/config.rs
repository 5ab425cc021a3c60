//! Store location and command target resolution.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use storebind_lib::store::{FileBackend, StorageArea};

use crate::output::OutputFormat;

/// Environment variable naming the store directory.
pub const STORE_DIR_ENV: &str = "SBIND_STORE";

/// Everything the global flags pin down before a subcommand runs.
pub struct Target {
  pub store_dir: PathBuf,
  pub area: StorageArea,
  pub format: OutputFormat,
}

impl Target {
  /// File backend rooted at the resolved store directory.
  pub fn backend(&self) -> Arc<FileBackend> {
    debug!(store = %self.store_dir.display(), area = %self.area, "opening file-backed store");
    Arc::new(FileBackend::new(&self.store_dir))
  }
}

/// Resolve the directory holding the store's area files.
///
/// Priority order:
/// 1. The `--store` flag
/// 2. The `SBIND_STORE` environment variable
/// 3. `storebind/` under the platform data directory
pub fn resolve_store_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
  if let Some(dir) = flag {
    return Ok(dir);
  }

  if let Ok(dir) = std::env::var(STORE_DIR_ENV) {
    if !dir.is_empty() {
      return Ok(PathBuf::from(dir));
    }
  }

  let data_dir = dirs::data_dir().context("Failed to locate a data directory for the store")?;
  Ok(data_dir.join("storebind"))
}

/// Parse a value argument as JSON, falling back to a bare string.
///
/// `5`, `true`, and `{"a": 1}` parse as their JSON types; `dark` becomes the
/// string `"dark"`.
pub fn parse_value_arg(raw: &str) -> Value {
  serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
