//! Post-read value coercion through named, registered strategies.
//!
//! A binding may name a wrap strategy (`wrap_as`). After a successful read the
//! strategy gets a chance to convert the raw stored value into a richer or
//! normalized shape. Wrapping is best-effort cosmetics: a strategy that
//! declines or fails never fails the read, the raw value is simply kept.
//!
//! Strategies are plain functions registered under a name at configuration
//! time. Naming a strategy that was never registered is a configuration error
//! caught when the binding is constructed, not a silent fallback.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use storebind_lib::wrap::WrapRegistry;
//!
//! let mut registry = WrapRegistry::with_defaults();
//! registry.register("Celsius", |raw| {
//!   let fahrenheit = raw.as_f64()?;
//!   Some(json!((fahrenheit - 32.0) * 5.0 / 9.0))
//! });
//!
//! assert_eq!(registry.apply("Celsius", Some(json!(212.0))), Some(json!(100.0)));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

/// A conversion applied to a raw stored value after a successful read.
///
/// Returning `None` declines the conversion and keeps the raw value.
pub type WrapFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Named wrap strategies available to a binding.
#[derive(Clone, Default)]
pub struct WrapRegistry {
  strategies: HashMap<String, WrapFn>,
}

impl WrapRegistry {
  /// An empty registry with no strategies.
  pub fn new() -> Self {
    Self {
      strategies: HashMap::new(),
    }
  }

  /// A registry with the built-in strategies registered.
  ///
  /// Currently only `"Date"`: accepts an RFC 3339 string or an integer
  /// epoch-milliseconds value and yields the canonical RFC 3339 string in
  /// UTC; anything else declines.
  pub fn with_defaults() -> Self {
    let mut registry = Self::new();
    registry.register("Date", wrap_date);
    registry
  }

  /// Register `strategy` under `name`, replacing any previous entry.
  pub fn register<F>(&mut self, name: impl Into<String>, strategy: F)
  where
    F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
  {
    self.strategies.insert(name.into(), Arc::new(strategy));
  }

  /// Whether a strategy is registered under `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.strategies.contains_key(name)
  }

  /// Apply the named strategy to `raw`.
  ///
  /// Absent input stays absent. A declined conversion keeps the raw value.
  /// When both the raw and the wrapped value are mappings, raw fields the
  /// wrapped value does not define are copied onto it, so field access keeps
  /// matching the original payload.
  pub fn apply(&self, name: &str, raw: Option<Value>) -> Option<Value> {
    let raw = raw?;

    let Some(strategy) = self.strategies.get(name) else {
      // Unknown names are rejected when the binding is configured; this arm
      // is only reachable through a registry used directly.
      debug!(strategy = %name, "wrap strategy not registered, keeping raw value");
      return Some(raw);
    };

    match strategy(&raw) {
      Some(wrapped) => Some(merge_missing(wrapped, raw)),
      None => {
        debug!(strategy = %name, "wrap strategy declined, keeping raw value");
        Some(raw)
      }
    }
  }
}

impl fmt::Debug for WrapRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
    names.sort_unstable();
    f.debug_struct("WrapRegistry").field("strategies", &names).finish()
  }
}

/// Copy fields of `raw` that `wrapped` does not define onto `wrapped`.
///
/// Only applies when both values are mappings; any other combination returns
/// `wrapped` untouched.
fn merge_missing(mut wrapped: Value, raw: Value) -> Value {
  if let (Value::Object(target), Value::Object(source)) = (&mut wrapped, raw) {
    for (key, value) in source {
      target.entry(key).or_insert(value);
    }
  }
  wrapped
}

/// Built-in `"Date"` strategy.
fn wrap_date(raw: &Value) -> Option<Value> {
  match raw {
    Value::String(text) => {
      let parsed = DateTime::parse_from_rfc3339(text).ok()?;
      Some(Value::String(parsed.with_timezone(&Utc).to_rfc3339()))
    }
    Value::Number(number) => {
      let millis = number.as_i64()?;
      let parsed = DateTime::from_timestamp_millis(millis)?;
      Some(Value::String(parsed.to_rfc3339()))
    }
    _ => None,
  }
}
