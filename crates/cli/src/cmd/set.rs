//! Implementation of the `sbind set` command.
//!
//! Writes a value under a name. Dotted paths are nested under their root key
//! before the store's top-level merge.

use anyhow::{Context, Result};

use storebind_lib::binding::{Binding, BindingConfig, BindingName};

use crate::config::{Target, parse_value_arg};
use crate::output::{print_json, print_success};

/// Execute the set command.
pub fn cmd_set(target: &Target, name: &str, value: &str) -> Result<()> {
  let config = BindingConfig {
    area: target.area,
    name: BindingName::from(name),
    ..BindingConfig::default()
  };
  let (mut binding, mut events) = Binding::new(target.backend(), config)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(async {
    binding.set_value(parse_value_arg(value)).await;
    binding.store().await
  })
  .context("Failed to write to the store")?;

  if target.format.is_json() {
    if let Ok(event) = events.try_recv() {
      print_json(&event)?;
    }
  } else {
    print_success(&format!("saved '{}'", name));
  }

  Ok(())
}
