//! Implementation of the `sbind clear` command.
//!
//! Wipes every entry in the selected storage area.

use anyhow::{Context, Result};

use storebind_lib::binding::{Binding, BindingConfig};

use crate::config::Target;
use crate::output::{print_json, print_success};

/// Execute the clear command.
pub fn cmd_clear(target: &Target) -> Result<()> {
  let config = BindingConfig {
    area: target.area,
    ..BindingConfig::default()
  };
  let (mut binding, mut events) = Binding::new(target.backend(), config)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(binding.clear()).context("Failed to clear the store")?;

  if target.format.is_json() {
    if let Ok(event) = events.try_recv() {
      print_json(&event)?;
    }
  } else {
    print_success(&format!("cleared the {} area", target.area));
  }

  Ok(())
}
