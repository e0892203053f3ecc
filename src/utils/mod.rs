//! Utility functions module
//!
//! This module contains output formatting helpers used by the `weftc`
//! inspection tool.

pub mod format;

pub use format::*;
