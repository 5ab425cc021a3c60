//! Implementation of the `sbind remove` command.
//!
//! Deletes top-level keys. Names are matched literally, so `a.b` removes the
//! key spelled `a.b`, not a nested field of `a`.

use anyhow::{Context, Result};

use storebind_lib::binding::{Binding, BindingConfig, BindingName};

use crate::config::Target;
use crate::output::{print_json, print_success};

/// Execute the remove command.
pub fn cmd_remove(target: &Target, names: &[String]) -> Result<()> {
  let name = match names {
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
  rt.block_on(binding.remove()).context("Failed to remove from the store")?;

  if target.format.is_json() {
    if let Ok(event) = events.try_recv() {
      print_json(&event)?;
    }
  } else {
    print_success(&format!("removed '{}'", names.join("', '")));
  }

  Ok(())
}
