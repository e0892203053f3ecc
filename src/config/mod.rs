//! Configuration management module
//!
//! This module handles locating the project configuration file, normalizing
//! its contents, validating option combinations, and merging the result
//! over the framework defaults.

pub mod loader;
pub mod resolve;
pub mod settings;

pub use loader::*;
pub use resolve::*;
pub use settings::*;
