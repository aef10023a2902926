//! Deployment configuration for a bridge process: serde schema,
//! `${ENV_VAR}` substitution, and multi-format loading with discovery.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use loader::{discover_and_load, load_config};
pub use schema::{BridgeConfig, BridgeSection, PlatformConfig, RouterConfig};
