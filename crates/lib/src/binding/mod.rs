//! Declarative state-to-store binding.
//!
//! A [`Binding`] attaches one JSON value to a location in a namespaced
//! key-value store and keeps the two sides in step. Reads narrow the store's
//! top-level entries down a dotted path; writes nest the held value back under
//! the same path. Every store interaction completes with exactly one
//! [`BindingEvent`] on the channel handed out at construction.
//!
//! # Lifecycle
//!
//! - [`Binding::new`] validates the configuration and returns the binding
//!   together with its event receiver.
//! - [`Binding::read`] pulls the named value into the binding (`read` event).
//! - [`Binding::store`] pushes the held value out (`saved` event).
//! - [`Binding::remove`], [`Binding::clear`], and [`Binding::usage`] map to
//!   the store's delete, wipe, and measure calls (`removed` / `clear` /
//!   `bytes-used` events).
//! - With `auto_sync` on, [`Binding::set_value`] stores immediately and
//!   [`Binding::set_name`] re-reads. A completed read assigns the value slot
//!   directly, so loading a value never triggers a store of its own.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use storebind_lib::binding::{Binding, BindingConfig, BindingName};
//! use storebind_lib::store::MemoryBackend;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(MemoryBackend::new());
//! let config = BindingConfig {
//!   name: BindingName::from("profile.theme"),
//!   default_value: json!("light"),
//!   ..BindingConfig::default()
//! };
//! let (mut binding, mut events) = Binding::new(backend, config)?;
//!
//! binding.read().await?;
//! assert_eq!(binding.value(), Some(&json!("light")));
//! assert_eq!(events.recv().await.unwrap().kind(), "read");
//! # Ok(())
//! # }
//! ```
//!
//! # Submodules
//!
//! - [`gateway`] - Translation from binding names to store calls
//! - [`types`] - Configuration, event, and error types

pub mod gateway;
mod types;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::store::{StorageArea, StorageBackend};
use crate::wrap::WrapRegistry;

pub use types::*;

use gateway::StorageGateway;

/// A live link between one JSON value and its place in the store.
///
/// Operations take `&mut self`, so a binding runs one store interaction at a
/// time; each interaction mutates the binding first and then emits its single
/// event. Distinct bindings over one backend race at the store, where the
/// last completed write wins.
pub struct Binding {
  area: StorageArea,
  name: BindingName,
  value: Option<Value>,
  auto_sync: bool,
  default_value: Value,
  wrap_as: Option<String>,
  strategies: WrapRegistry,
  backend: Arc<dyn StorageBackend>,
  events: mpsc::UnboundedSender<BindingEvent>,
}

impl Binding {
  /// Build a binding over `backend` and hand back its event receiver.
  ///
  /// # Errors
  ///
  /// Returns [`BindingError::UnknownWrapStrategy`] when `wrap_as` names a
  /// strategy the config's registry does not contain.
  pub fn new(
    backend: Arc<dyn StorageBackend>,
    config: BindingConfig,
  ) -> Result<(Self, mpsc::UnboundedReceiver<BindingEvent>), BindingError> {
    if let Some(wrap_as) = &config.wrap_as {
      if !config.strategies.contains(wrap_as) {
        return Err(BindingError::UnknownWrapStrategy(wrap_as.clone()));
      }
    }

    let (events, receiver) = mpsc::unbounded_channel();
    let binding = Self {
      area: config.area,
      name: config.name,
      value: None,
      auto_sync: config.auto_sync,
      default_value: config.default_value,
      wrap_as: config.wrap_as,
      strategies: config.strategies,
      backend,
      events,
    };

    Ok((binding, receiver))
  }

  /// The value most recently read from or assigned to the binding.
  ///
  /// `None` until the first read or [`Binding::set_value`].
  pub fn value(&self) -> Option<&Value> {
    self.value.as_ref()
  }

  pub fn name(&self) -> &BindingName {
    &self.name
  }

  pub fn area(&self) -> StorageArea {
    self.area
  }

  pub fn auto_sync(&self) -> bool {
    self.auto_sync
  }

  /// Point the binding at another storage area. Takes effect on the next
  /// operation; nothing is read or written here.
  pub fn set_area(&mut self, area: StorageArea) {
    self.area = area;
  }

  pub fn set_auto_sync(&mut self, auto_sync: bool) {
    self.auto_sync = auto_sync;
  }

  /// Rename the binding. With `auto_sync` on, a non-empty name is read
  /// immediately; the outcome lands on the event channel.
  pub async fn set_name(&mut self, name: impl Into<BindingName>) {
    self.name = name.into();

    if self.auto_sync && !self.name.is_empty() {
      let _ = self.read().await;
    }
  }

  /// Assign a new value. With `auto_sync` on, the value is stored
  /// immediately; the outcome lands on the event channel.
  pub async fn set_value(&mut self, value: Value) {
    self.value = Some(value);

    if self.auto_sync {
      let _ = self.store().await;
    }
  }

  /// Pull the named value from the store into the binding.
  ///
  /// Absent entries fall back to the configured default, and the result
  /// passes through the wrap strategy when one is configured. Completion
  /// emits `read` with the value now held, or `error` with the binding's
  /// value untouched.
  pub async fn read(&mut self) -> Result<Value, BindingError> {
    debug!(area = %self.area, name = ?self.name, "reading bound value");

    let raw = self
      .gateway()
      .read(&self.name, &self.default_value)
      .await
      .map_err(|e| self.fail(e))?;

    let value = self.wrap(raw);
    self.value = Some(value.clone());
    self.emit(BindingEvent::Read { value: value.clone() });
    Ok(value)
  }

  /// Push the held value out to the store.
  ///
  /// A binding that holds nothing stores `null`. Completion emits `saved`
  /// or `error`.
  pub async fn store(&mut self) -> Result<(), BindingError> {
    debug!(area = %self.area, name = ?self.name, "storing bound value");

    let value = self.value.clone().unwrap_or(Value::Null);
    self.gateway().write(&self.name, value).await.map_err(|e| self.fail(e))?;

    self.emit(BindingEvent::Saved);
    Ok(())
  }

  /// Delete the bound entries from the store.
  ///
  /// The binding's own value stays in place; only the store side is dropped.
  /// Completion emits `removed` or `error`.
  pub async fn remove(&mut self) -> Result<(), BindingError> {
    debug!(area = %self.area, name = ?self.name, "removing bound entries");

    self.gateway().remove(&self.name).await.map_err(|e| self.fail(e))?;

    self.emit(BindingEvent::Removed);
    Ok(())
  }

  /// Wipe the binding's whole storage area. Completion emits `clear` or
  /// `error`.
  pub async fn clear(&mut self) -> Result<(), BindingError> {
    debug!(area = %self.area, "clearing storage area");

    self.gateway().clear().await.map_err(|e| self.fail(e))?;

    self.emit(BindingEvent::Clear);
    Ok(())
  }

  /// Measure the bytes the bound entries occupy; the empty name measures the
  /// whole area. Completion emits `bytes-used` or `error`.
  pub async fn usage(&mut self) -> Result<u64, BindingError> {
    debug!(area = %self.area, name = ?self.name, "measuring bytes in use");

    let bytes = self.gateway().usage(&self.name).await.map_err(|e| self.fail(e))?;

    self.emit(BindingEvent::BytesUsed { bytes });
    Ok(bytes)
  }

  fn gateway(&self) -> StorageGateway {
    StorageGateway::new(self.backend.clone(), self.area)
  }

  fn wrap(&self, raw: Value) -> Value {
    match &self.wrap_as {
      // apply never drops a present value
      Some(strategy) => self.strategies.apply(strategy, Some(raw)).unwrap_or_default(),
      None => raw,
    }
  }

  fn emit(&self, event: BindingEvent) {
    // Nobody listening is fine; events are advisory
    let _ = self.events.send(event);
  }

  fn fail(&self, error: BindingError) -> BindingError {
    self.emit(BindingEvent::Error {
      message: error.to_string(),
    });
    error
  }
}

impl fmt::Debug for Binding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Binding")
      .field("area", &self.area)
      .field("name", &self.name)
      .field("value", &self.value)
      .field("auto_sync", &self.auto_sync)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io;

  use async_trait::async_trait;
  use serde_json::json;

  use crate::store::{BackendError, Entries, GetQuery, MemoryBackend};

  fn entries(pairs: &[(&str, Value)]) -> Entries {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  async fn binding_over(
    pairs: &[(&str, Value)],
    config: BindingConfig,
  ) -> (Binding, mpsc::UnboundedReceiver<BindingEvent>) {
    let backend = MemoryBackend::new();
    backend.seed(StorageArea::Local, entries(pairs)).await;
    Binding::new(Arc::new(backend), config).unwrap()
  }

  fn drain(events: &mut mpsc::UnboundedReceiver<BindingEvent>) -> Vec<BindingEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
      out.push(event);
    }
    out
  }

  /// A store whose every call fails, for exercising error paths.
  struct FailingBackend;

  impl FailingBackend {
    fn error() -> BackendError {
      BackendError::Read(io::Error::other("disk detached"))
    }
  }

  #[async_trait]
  impl StorageBackend for FailingBackend {
    async fn get(&self, _area: StorageArea, _query: &GetQuery) -> Result<Entries, BackendError> {
      Err(Self::error())
    }

    async fn set(&self, _area: StorageArea, _entries: Entries) -> Result<(), BackendError> {
      Err(Self::error())
    }

    async fn remove(&self, _area: StorageArea, _keys: &[String]) -> Result<(), BackendError> {
      Err(Self::error())
    }

    async fn clear(&self, _area: StorageArea) -> Result<(), BackendError> {
      Err(Self::error())
    }

    async fn bytes_in_use(&self, _area: StorageArea, _keys: Option<&[String]>) -> Result<u64, BackendError> {
      Err(Self::error())
    }
  }

  // ==========================================================================
  // Construction
  // ==========================================================================

  #[test]
  fn unknown_wrap_strategy_fails_construction() {
    let config = BindingConfig {
      wrap_as: Some("Temperature".to_string()),
      ..BindingConfig::default()
    };

    let result = Binding::new(Arc::new(MemoryBackend::new()), config);
    match result {
      Err(BindingError::UnknownWrapStrategy(name)) => assert_eq!(name, "Temperature"),
      other => panic!("expected UnknownWrapStrategy, got {other:?}"),
    }
  }

  #[test]
  fn registered_wrap_strategy_passes_construction() {
    let config = BindingConfig {
      wrap_as: Some("Date".to_string()),
      ..BindingConfig::default()
    };

    assert!(Binding::new(Arc::new(MemoryBackend::new()), config).is_ok());
  }

  // ==========================================================================
  // Reading
  // ==========================================================================

  #[tokio::test]
  async fn read_narrows_a_dotted_path() {
    let config = BindingConfig {
      name: BindingName::from("a.b"),
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = binding_over(&[("a", json!({"b": 5}))], config).await;

    let value = binding.read().await.unwrap();

    assert_eq!(value, json!(5));
    assert_eq!(binding.value(), Some(&json!(5)));
    assert_eq!(drain(&mut events), vec![BindingEvent::Read { value: json!(5) }]);
  }

  #[tokio::test]
  async fn read_of_an_empty_store_reports_the_default() {
    let config = BindingConfig {
      name: BindingName::from("counter"),
      default_value: json!(0),
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = binding_over(&[], config).await;

    let value = binding.read().await.unwrap();

    assert_eq!(value, json!(0));
    assert_eq!(drain(&mut events), vec![BindingEvent::Read { value: json!(0) }]);
  }

  #[tokio::test]
  async fn failed_read_keeps_the_previous_value() {
    let config = BindingConfig {
      name: BindingName::from("a"),
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = Binding::new(Arc::new(FailingBackend), config).unwrap();
    binding.set_value(json!("held")).await;

    let result = binding.read().await;

    assert!(matches!(result, Err(BindingError::Backend(BackendError::Read(_)))));
    assert_eq!(binding.value(), Some(&json!("held")));

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), "error");
    match &events[0] {
      BindingEvent::Error { message } => assert!(message.contains("disk detached")),
      other => panic!("expected an error event, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn wrap_strategy_applies_on_read() {
    let mut strategies = WrapRegistry::new();
    strategies.register("Shout", |raw: &Value| {
      raw.as_str().map(|s| Value::String(s.to_uppercase()))
    });

    let config = BindingConfig {
      name: BindingName::from("greeting"),
      wrap_as: Some("Shout".to_string()),
      strategies,
      ..BindingConfig::default()
    };
    let (mut binding, _events) = binding_over(&[("greeting", json!("hello"))], config).await;

    let value = binding.read().await.unwrap();
    assert_eq!(value, json!("HELLO"));
  }

  #[tokio::test]
  async fn date_wrap_normalizes_on_read() {
    let config = BindingConfig {
      name: BindingName::from("last_seen"),
      wrap_as: Some("Date".to_string()),
      ..BindingConfig::default()
    };
    let (mut binding, _events) = binding_over(&[("last_seen", json!(1000))], config).await;

    let value = binding.read().await.unwrap();
    assert_eq!(value, json!("1970-01-01T00:00:01+00:00"));
  }

  // ==========================================================================
  // Storing
  // ==========================================================================

  #[tokio::test]
  async fn store_persists_the_held_value() {
    let backend = Arc::new(MemoryBackend::new());
    let config = BindingConfig {
      name: BindingName::from("profile.theme"),
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = Binding::new(backend.clone(), config).unwrap();

    binding.set_value(json!("dark")).await;
    binding.store().await.unwrap();

    let stored = backend.get(StorageArea::Local, &GetQuery::All).await.unwrap();
    assert_eq!(stored, entries(&[("profile", json!({"theme": "dark"}))]));
    assert_eq!(drain(&mut events), vec![BindingEvent::Saved]);
  }

  #[tokio::test]
  async fn store_with_no_value_writes_null() {
    let backend = Arc::new(MemoryBackend::new());
    let config = BindingConfig {
      name: BindingName::from("slot"),
      ..BindingConfig::default()
    };
    let (mut binding, _events) = Binding::new(backend.clone(), config).unwrap();

    binding.store().await.unwrap();

    let stored = backend.get(StorageArea::Local, &GetQuery::All).await.unwrap();
    assert_eq!(stored, entries(&[("slot", Value::Null)]));
  }

  #[tokio::test]
  async fn managed_writes_fail_with_the_store_message() {
    let config = BindingConfig {
      area: StorageArea::Managed,
      name: BindingName::from(vec!["x".to_string(), "y".to_string()]),
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = Binding::new(Arc::new(MemoryBackend::new()), config).unwrap();
    binding.set_value(json!({"x": 1, "y": 2})).await;

    let result = binding.store().await;

    assert!(matches!(
      result,
      Err(BindingError::Backend(BackendError::ReadOnlyArea))
    ));
    assert_eq!(
      drain(&mut events),
      vec![BindingEvent::Error {
        message: "the managed storage area is read-only".to_string(),
      }]
    );
  }

  // ==========================================================================
  // Auto Sync
  // ==========================================================================

  #[tokio::test]
  async fn auto_sync_stores_on_set_value() {
    let backend = Arc::new(MemoryBackend::new());
    let config = BindingConfig {
      name: BindingName::from("counter"),
      auto_sync: true,
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = Binding::new(backend.clone(), config).unwrap();

    binding.set_value(json!(41)).await;

    let stored = backend.get(StorageArea::Local, &GetQuery::All).await.unwrap();
    assert_eq!(stored, entries(&[("counter", json!(41))]));
    assert_eq!(drain(&mut events), vec![BindingEvent::Saved]);
  }

  #[tokio::test]
  async fn auto_sync_reads_on_rename() {
    let config = BindingConfig {
      auto_sync: true,
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = binding_over(&[("b", json!(2))], config).await;

    binding.set_name("b").await;

    assert_eq!(binding.value(), Some(&json!(2)));
    assert_eq!(drain(&mut events), vec![BindingEvent::Read { value: json!(2) }]);
  }

  #[tokio::test]
  async fn reading_never_echoes_a_store() {
    let config = BindingConfig {
      name: BindingName::from("a"),
      auto_sync: true,
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = binding_over(&[("a", json!(1))], config).await;

    binding.read().await.unwrap();

    // One read event and nothing else; a save echo would show up here
    assert_eq!(drain(&mut events), vec![BindingEvent::Read { value: json!(1) }]);
  }

  #[tokio::test]
  async fn renaming_to_the_empty_path_is_quiet() {
    let config = BindingConfig {
      name: BindingName::from("a"),
      auto_sync: true,
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = binding_over(&[("a", json!(1))], config).await;

    binding.set_name("").await;

    assert!(binding.name().is_empty());
    assert!(drain(&mut events).is_empty());
  }

  // ==========================================================================
  // Removal and Clearing
  // ==========================================================================

  #[tokio::test]
  async fn remove_drops_the_store_side_and_keeps_the_value() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed(StorageArea::Local, entries(&[("theme", json!("dark"))])).await;
    let config = BindingConfig {
      name: BindingName::from("theme"),
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = Binding::new(backend.clone(), config).unwrap();

    binding.read().await.unwrap();
    drain(&mut events);

    binding.remove().await.unwrap();

    assert_eq!(binding.value(), Some(&json!("dark")));
    let stored = backend.get(StorageArea::Local, &GetQuery::All).await.unwrap();
    assert!(stored.is_empty());
    assert_eq!(drain(&mut events), vec![BindingEvent::Removed]);
  }

  #[tokio::test]
  async fn remove_of_a_defaults_name_reports_invalid_name() {
    let config = BindingConfig {
      name: BindingName::Defaults(entries(&[("a", json!(0))])),
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = binding_over(&[("a", json!(1))], config).await;

    let result = binding.remove().await;

    assert!(matches!(result, Err(BindingError::InvalidName)));
    assert_eq!(
      drain(&mut events),
      vec![BindingEvent::Error {
        message: "\"name\" must be either a string or an array.".to_string(),
      }]
    );
  }

  #[tokio::test]
  async fn clear_wipes_the_area_and_fires_clear() {
    let backend = Arc::new(MemoryBackend::new());
    backend
      .seed(StorageArea::Local, entries(&[("a", json!(1)), ("b", json!(2))]))
      .await;
    let (mut binding, mut events) = Binding::new(backend.clone(), BindingConfig::default()).unwrap();

    binding.clear().await.unwrap();

    let stored = backend.get(StorageArea::Local, &GetQuery::All).await.unwrap();
    assert!(stored.is_empty());
    assert_eq!(drain(&mut events), vec![BindingEvent::Clear]);
  }

  // ==========================================================================
  // Usage
  // ==========================================================================

  #[tokio::test]
  async fn usage_reports_bytes_for_the_whole_area() {
    // "a" + "5" = 2 bytes, "bb" + "\"x\"" = 5 bytes
    let (mut binding, mut events) = binding_over(
      &[("a", json!(5)), ("bb", json!("x"))],
      BindingConfig::default(),
    )
    .await;

    let bytes = binding.usage().await.unwrap();

    assert_eq!(bytes, 7);
    assert_eq!(drain(&mut events), vec![BindingEvent::BytesUsed { bytes: 7 }]);
  }

  // ==========================================================================
  // Events
  // ==========================================================================

  #[tokio::test]
  async fn every_completion_lands_exactly_one_event() {
    let config = BindingConfig {
      name: BindingName::from("a"),
      ..BindingConfig::default()
    };
    let (mut binding, mut events) = binding_over(&[("a", json!(1))], config).await;

    binding.read().await.unwrap();
    binding.store().await.unwrap();
    binding.usage().await.unwrap();
    binding.remove().await.unwrap();
    binding.clear().await.unwrap();

    let kinds: Vec<&str> = drain(&mut events).iter().map(BindingEvent::kind).collect();
    assert_eq!(kinds, vec!["read", "saved", "bytes-used", "removed", "clear"]);
  }

  #[tokio::test]
  async fn dropped_receiver_does_not_fail_operations() {
    let config = BindingConfig {
      name: BindingName::from("a"),
      ..BindingConfig::default()
    };
    let (mut binding, events) = binding_over(&[("a", json!(1))], config).await;
    drop(events);

    binding.read().await.unwrap();
    binding.set_value(json!(2)).await;
    binding.store().await.unwrap();
  }
}
