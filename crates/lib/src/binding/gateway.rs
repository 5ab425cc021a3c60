//! Name-directed access to a storage backend.
//!
//! The gateway owns the translation from a [`BindingName`] to concrete store
//! calls. Path names become single-key default queries narrowed to the leaf;
//! structural names pass through as whole-object reads and writes. Shape
//! errors are caught locally, before the store is touched.

use std::sync::Arc;

use serde_json::Value;

use super::types::{BindingError, BindingName};
use crate::path::{build_nested, extract, to_segments};
use crate::store::{Entries, GetQuery, StorageArea, StorageBackend};

/// Translates binding names into store operations on one area.
#[derive(Clone)]
pub struct StorageGateway {
  backend: Arc<dyn StorageBackend>,
  area: StorageArea,
}

impl StorageGateway {
  pub fn new(backend: Arc<dyn StorageBackend>, area: StorageArea) -> Self {
    Self { backend, area }
  }

  /// Read the value the name points at, falling back to `default`.
  ///
  /// A path name queries its root key with `default` as the store-side
  /// fill-in, then narrows the result along the full path; when the path dead
  /// ends inside the result, `default` stands in. Structural names return the
  /// whole queried object.
  pub async fn read(&self, name: &BindingName, default: &Value) -> Result<Value, BindingError> {
    match name {
      BindingName::Path(path) => {
        let segments = to_segments(path);

        let mut defaults = Entries::new();
        if let Some(root) = segments.first() {
          defaults.insert(root.clone(), default.clone());
        }

        let result = self.backend.get(self.area, &GetQuery::Defaults(defaults)).await?;
        let root_value = Value::Object(result);
        Ok(extract(&root_value, &segments).cloned().unwrap_or_else(|| default.clone()))
      }
      BindingName::Keys(keys) => {
        let result = self.backend.get(self.area, &GetQuery::Keys(keys.clone())).await?;
        Ok(Value::Object(result))
      }
      BindingName::Defaults(defaults) => {
        let result = self.backend.get(self.area, &GetQuery::Defaults(defaults.clone())).await?;
        Ok(Value::Object(result))
      }
    }
  }

  /// Persist `value` under the name.
  ///
  /// A path name nests the value under its segments; the store then merges
  /// the root key shallowly, so siblings below the first level are replaced
  /// wholesale. A structural name spreads an object value across the
  /// namespace and rejects anything without keys to spread.
  pub async fn write(&self, name: &BindingName, value: Value) -> Result<(), BindingError> {
    let entries = match name {
      BindingName::Path(path) => {
        let segments = to_segments(path);
        // build_nested always yields a mapping
        let Value::Object(entries) = build_nested(&segments, value) else {
          return Err(BindingError::InvalidValue);
        };
        entries
      }
      BindingName::Keys(_) | BindingName::Defaults(_) => {
        let Value::Object(entries) = value else {
          return Err(BindingError::InvalidValue);
        };
        entries
      }
    };

    self.backend.set(self.area, entries).await?;
    Ok(())
  }

  /// Delete the named entries.
  ///
  /// A path name is treated as one literal top-level key, not resolved
  /// segment by segment. A key-to-default mapping has no removable shape.
  pub async fn remove(&self, name: &BindingName) -> Result<(), BindingError> {
    let keys = match name {
      BindingName::Path(path) => vec![path.clone()],
      BindingName::Keys(keys) => keys.clone(),
      BindingName::Defaults(_) => return Err(BindingError::InvalidName),
    };

    self.backend.remove(self.area, &keys).await?;
    Ok(())
  }

  /// Bytes consumed by the named entries; the empty name measures the whole
  /// namespace. Path names count as literal top-level keys, as in `remove`.
  pub async fn usage(&self, name: &BindingName) -> Result<u64, BindingError> {
    let bytes = match name {
      name if name.is_empty() => self.backend.bytes_in_use(self.area, None).await?,
      BindingName::Path(path) => {
        let keys = [path.clone()];
        self.backend.bytes_in_use(self.area, Some(&keys)).await?
      }
      BindingName::Keys(keys) => self.backend.bytes_in_use(self.area, Some(keys)).await?,
      BindingName::Defaults(defaults) => {
        let keys: Vec<String> = defaults.keys().cloned().collect();
        self.backend.bytes_in_use(self.area, Some(&keys)).await?
      }
    };

    Ok(bytes)
  }

  /// Wipe the entire area.
  pub async fn clear(&self) -> Result<(), BindingError> {
    self.backend.clear(self.area).await?;
    Ok(())
  }
}
