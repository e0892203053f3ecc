//! weft-config - Configuration for the weft web framework
//!
//! Locates a project's `weft.config.toml` / `weft.config.json`, merges it
//! with the framework defaults, validates option combinations, and hands
//! the build and server pipelines a fully populated configuration record.

pub mod cli;
pub mod config;
pub mod error;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, ConfigExport, ConfigLoader, Phase, Target, WeftConfig};
pub use error::{Result, WeftConfigError};
