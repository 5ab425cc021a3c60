//! Implementation of the `sbind get` command.
//!
//! Reads the value a name points at, narrowing dotted paths into nested
//! entries and falling back to the given default when the store has nothing.

use anyhow::{Context, Result};

use storebind_lib::binding::{Binding, BindingConfig, BindingName};

use crate::config::{Target, parse_value_arg};
use crate::output::print_json;

/// Execute the get command.
///
/// Prints the value as JSON on stdout, or the full `read` event with
/// `--format json`.
pub fn cmd_get(target: &Target, name: &str, default: Option<&str>) -> Result<()> {
  let config = BindingConfig {
    area: target.area,
    name: BindingName::from(name),
    default_value: default.map(parse_value_arg).unwrap_or_default(),
    ..BindingConfig::default()
  };
  let (mut binding, mut events) = Binding::new(target.backend(), config)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let value = rt.block_on(binding.read()).context("Failed to read from the store")?;

  if target.format.is_json() {
    if let Ok(event) = events.try_recv() {
      print_json(&event)?;
    }
  } else {
    println!("{}", serde_json::to_string_pretty(&value)?);
  }

  Ok(())
}
