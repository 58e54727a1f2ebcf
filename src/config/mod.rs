//! Configuration system for the PubChem MCP server
//!
//! Resolution order (highest to lowest):
//! 1. Command-line overrides
//! 2. User config file
//! 3. Built-in defaults

mod defaults;
mod loader;
mod user_config;

pub use defaults::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use loader::{ConfigLoader, ResolvedConfig};
pub use user_config::{ClientOverride, Settings, UserConfig};
