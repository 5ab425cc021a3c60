mod clear;
mod get;
mod remove;
mod set;
mod usage;

pub use clear::cmd_clear;
pub use get::cmd_get;
pub use remove::cmd_remove;
pub use set::cmd_set;
pub use usage::cmd_usage;
