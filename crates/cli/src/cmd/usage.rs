//! Implementation of the `sbind usage` command.
//!
//! Measures the bytes the named keys occupy, or the whole area when no name
//! is given. Each entry counts its key length plus its serialized value
//! length.

use anyhow::{Context, Result};

use storebind_lib::binding::{Binding, BindingConfig, BindingName};

use crate::config::Target;
use crate::output::{format_bytes, print_json, print_stat};

/// Execute the usage command.
pub fn cmd_usage(target: &Target, names: &[String]) -> Result<()> {
  let name = match names {
    [] => BindingName::default(),
    [single] => BindingName::from(single.as_str()),
    many => BindingName::Keys(many.to_vec()),
  };

  let config = BindingConfig {
    area: target.area,
    name,
    ..BindingConfig::default()
  };
  let (mut binding, mut events) = Binding::new(target.backend(), config)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let bytes = rt.block_on(binding.usage()).context("Failed to measure the store")?;

  if target.format.is_json() {
    if let Ok(event) = events.try_recv() {
      print_json(&event)?;
    }
  } else {
    print_stat("Area", &target.area.to_string());
    print_stat("Bytes in use", &format_bytes(bytes));
  }

  Ok(())
}
