//! Configuration, event, and error types shared across the binding.

use serde::Serialize;
use serde_json::Value;

use crate::store::{BackendError, Entries, StorageArea};
use crate::wrap::WrapRegistry;

/// What part of the storage namespace a binding is attached to.
///
/// A plain string is a dotted path into a single top-level entry. The two
/// structural forms address several top-level keys at once: a list of keys,
/// or a map of keys to the defaults returned when a key is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingName {
  /// Dotted path into one top-level entry, e.g. `"profile.theme"`.
  Path(String),
  /// Several top-level keys read and written as one object.
  Keys(Vec<String>),
  /// Top-level keys with per-key defaults for absent entries.
  Defaults(Entries),
}

impl BindingName {
  /// Whether the name addresses nothing at all.
  ///
  /// Only the empty path qualifies. An empty key list or default map is an
  /// empty selection, which is still a concrete (if useless) name.
  pub fn is_empty(&self) -> bool {
    matches!(self, BindingName::Path(path) if path.is_empty())
  }
}

impl Default for BindingName {
  fn default() -> Self {
    BindingName::Path(String::new())
  }
}

impl From<&str> for BindingName {
  fn from(path: &str) -> Self {
    BindingName::Path(path.to_string())
  }
}

impl From<String> for BindingName {
  fn from(path: String) -> Self {
    BindingName::Path(path)
  }
}

impl From<Vec<String>> for BindingName {
  fn from(keys: Vec<String>) -> Self {
    BindingName::Keys(keys)
  }
}

/// Everything a binding needs to know before it touches the store.
#[derive(Debug, Clone)]
pub struct BindingConfig {
  /// Storage area the binding reads from and writes to.
  pub area: StorageArea,
  /// Where in the namespace the bound value lives.
  pub name: BindingName,
  /// Push local changes and pull renames automatically.
  pub auto_sync: bool,
  /// Value reported when the store has nothing under the name.
  pub default_value: Value,
  /// Wrap strategy applied to values read from the store, by name.
  pub wrap_as: Option<String>,
  /// Strategies `wrap_as` may refer to.
  pub strategies: WrapRegistry,
}

impl Default for BindingConfig {
  fn default() -> Self {
    Self {
      area: StorageArea::default(),
      name: BindingName::default(),
      auto_sync: false,
      default_value: Value::Null,
      wrap_as: None,
      strategies: WrapRegistry::with_defaults(),
    }
  }
}

/// Notification emitted after each completed store interaction.
///
/// Every binding operation ends in exactly one event, success or failure.
/// Consumers that only care about one kind can match on [`BindingEvent::kind`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BindingEvent {
  /// A value arrived from the store and the binding now holds it.
  Read { value: Value },
  /// The bound value was persisted.
  Saved,
  /// The bound keys were deleted.
  Removed,
  /// The whole area was wiped.
  Clear,
  /// Result of a usage query.
  BytesUsed { bytes: u64 },
  /// An operation failed; the binding's value is unchanged.
  Error { message: String },
}

impl BindingEvent {
  /// Stable string tag for this event, matching its serialized `type` field.
  pub fn kind(&self) -> &'static str {
    match self {
      BindingEvent::Read { .. } => "read",
      BindingEvent::Saved => "saved",
      BindingEvent::Removed => "removed",
      BindingEvent::Clear => "clear",
      BindingEvent::BytesUsed { .. } => "bytes-used",
      BindingEvent::Error { .. } => "error",
    }
  }
}

/// Errors surfaced by binding operations.
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
  /// The name's shape does not fit the operation.
  #[error("\"name\" must be either a string or an array.")]
  InvalidName,

  /// A structural name was asked to store a value that has no keys to spread.
  #[error("a structural name requires an object value")]
  InvalidValue,

  /// `wrap_as` referred to a strategy the registry does not know.
  #[error("unknown wrap strategy '{0}'")]
  UnknownWrapStrategy(String),

  /// The store itself refused or failed the operation.
  #[error(transparent)]
  Backend(#[from] BackendError),
}
