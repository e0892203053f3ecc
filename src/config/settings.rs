//! Configuration record and defaults
//!
//! This module defines the typed configuration record for the weft
//! framework, the fully-populated default instance, and the constants
//! shared by the resolver and loader.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, WeftConfigError};

/// Base name shared by every recognized configuration file.
pub const CONFIG_BASE_NAME: &str = "weft.config";

/// File extensions the loader can parse.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["toml", "json"];

/// File extensions recognized only to produce a targeted error when a
/// config file was written in a format the loader does not read.
pub const UNSUPPORTED_EXTENSIONS: [&str; 3] = ["yaml", "yml", "ini"];

/// Directory served verbatim for static assets. `dist_dir` must never
/// point at it.
pub const RESERVED_STATIC_DIR: &str = "public";

/// Environment variable overriding the detected CPU core count.
pub const CPU_COUNT_ENV: &str = "WEFT_CPU_COUNT";

/// Deployment target controlling the shape of the emitted bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    Server,
    Serverless,
    ExperimentalServerlessTrace,
}

impl Target {
    /// Every accepted `target` value, for error messages
    pub const VALID: [&'static str; 3] =
        ["server", "serverless", "experimental-serverless-trace"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Server => "server",
            Target::Serverless => "serverless",
            Target::ExperimentalServerlessTrace => "experimental-serverless-trace",
        }
    }

    /// True for the serverless bundle variants, which share build and
    /// runtime constraints (no runtime config, per-page entry points)
    pub fn is_serverless_like(&self) -> bool {
        matches!(self, Target::Serverless | Target::ExperimentalServerlessTrace)
    }
}

impl Default for Target {
    fn default() -> Self {
        Target::Server
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = WeftConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "server" => Ok(Target::Server),
            "serverless" => Ok(Target::Serverless),
            "experimental-serverless-trace" => Ok(Target::ExperimentalServerlessTrace),
            other => Err(WeftConfigError::InvalidTarget {
                value: other.to_string(),
                valid: Target::VALID.to_vec(),
            }),
        }
    }
}

/// React rendering mode for the experimental renderer integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReactMode {
    Legacy,
    Blocking,
    Concurrent,
}

impl ReactMode {
    /// Every accepted `experimental.react_mode` value, for error messages
    pub const VALID: [&'static str; 3] = ["legacy", "blocking", "concurrent"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactMode::Legacy => "legacy",
            ReactMode::Blocking => "blocking",
            ReactMode::Concurrent => "concurrent",
        }
    }
}

impl Default for ReactMode {
    fn default() -> Self {
        ReactMode::Legacy
    }
}

impl fmt::Display for ReactMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactMode {
    type Err = WeftConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "legacy" => Ok(ReactMode::Legacy),
            "blocking" => Ok(ReactMode::Blocking),
            "concurrent" => Ok(ReactMode::Concurrent),
            other => Err(WeftConfigError::InvalidReactMode {
                value: other.to_string(),
                valid: ReactMode::VALID.to_vec(),
            }),
        }
    }
}

/// Development-mode indicator overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevIndicators {
    pub build_activity: bool,
    pub auto_prerender: bool,
}

impl Default for DevIndicators {
    fn default() -> Self {
        Self {
            build_activity: true,
            auto_prerender: true,
        }
    }
}

/// Keep-alive policy for pages compiled on demand during development
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnDemandEntries {
    /// How long a compiled page may sit unused before disposal
    pub max_inactive_age_ms: u64,
    /// Number of pages kept alive regardless of age
    pub pages_buffer_length: u32,
}

impl Default for OnDemandEntries {
    fn default() -> Self {
        Self {
            max_inactive_age_ms: 60_000,
            pages_buffer_length: 2,
        }
    }
}

/// AMP rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AmpConfig {
    /// Base URL for canonical links on AMP pages; stored without a
    /// trailing slash
    pub canonical_base: String,
}

/// Unstable feature flags, exempt from semver guarantees.
///
/// Unknown keys are retained so in-flight flags from newer releases pass
/// through the loader untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentalConfig {
    /// Worker count for parallelizable build steps
    pub cpus: usize,
    pub css: bool,
    pub modern: bool,
    pub profiling: bool,
    pub spr_flush_to_disk: bool,
    pub worker_threads: bool,
    pub granular_chunks: bool,
    pub react_mode: ReactMode,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ExperimentalConfig {
    fn default() -> Self {
        Self {
            cpus: default_cpus(),
            css: false,
            modern: false,
            profiling: false,
            spr_flush_to_disk: true,
            worker_threads: false,
            granular_chunks: false,
            react_mode: ReactMode::Legacy,
            extra: Map::new(),
        }
    }
}

/// Resolved weft configuration.
///
/// Every field is populated after a load: user-supplied values are merged
/// over the defaults, and keys the framework does not know about are kept
/// in `extra` for plugins and build hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    /// Build output directory, relative to the project root
    pub dist_dir: String,
    /// Prefix prepended to emitted asset URLs (e.g. a CDN origin)
    pub asset_prefix: String,
    pub target: Target,
    /// Where this configuration came from: `default`, `server`, or the
    /// name of the configuration file
    pub config_origin: String,
    /// Extensions resolved when looking up page source files
    pub page_extensions: Vec<String>,
    pub powered_by_header: bool,
    pub compress: bool,
    pub generate_etags: bool,
    pub react_strict_mode: bool,
    pub export_trailing_slash: bool,
    pub dev_indicators: DevIndicators,
    pub on_demand_entries: OnDemandEntries,
    pub amp: AmpConfig,
    pub experimental: ExperimentalConfig,
    /// Values exposed to both server and client at runtime
    pub public_runtime_config: Map<String, Value>,
    /// Values exposed only to the server at runtime
    pub server_runtime_config: Map<String, Value>,
    /// Arbitrary additional keys passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for WeftConfig {
    fn default() -> Self {
        Self {
            dist_dir: ".weft".to_string(),
            asset_prefix: String::new(),
            target: Target::default(),
            config_origin: "default".to_string(),
            page_extensions: vec!["html".to_string(), "md".to_string()],
            powered_by_header: true,
            compress: true,
            generate_etags: true,
            react_strict_mode: false,
            export_trailing_slash: false,
            dev_indicators: DevIndicators::default(),
            on_demand_entries: OnDemandEntries::default(),
            amp: AmpConfig::default(),
            experimental: ExperimentalConfig::default(),
            public_runtime_config: Map::new(),
            server_runtime_config: Map::new(),
            extra: Map::new(),
        }
    }
}

impl WeftConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize this record to the JSON table model used by the merger
    pub fn to_table(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(WeftConfigError::serialization(
                "configuration did not serialize to a table",
            )),
        }
    }
}

/// Default worker count: one core is left free for the host, and the
/// `WEFT_CPU_COUNT` environment variable overrides detection outright.
pub fn default_cpus() -> usize {
    let detected = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus_from(env::var(CPU_COUNT_ENV).ok().as_deref(), detected)
}

fn cpus_from(override_value: Option<&str>, detected: usize) -> usize {
    let count = override_value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(detected);
    count.saturating_sub(1).max(1)
}

const STARTER_CONFIG: &str = "\
# weft configuration
# https://weft.rs/docs/configuration

# dist_dir = \".weft\"
# asset_prefix = \"\"
# target = \"server\"

# [on_demand_entries]
# max_inactive_age_ms = 60000
# pages_buffer_length = 2
";

/// Write a starter configuration file into `dir`.
///
/// An existing configuration file is never overwritten; its path is
/// returned instead.
pub fn init_starter_config(dir: &Path) -> Result<PathBuf> {
    for ext in SUPPORTED_EXTENSIONS {
        let existing = dir.join(format!("{CONFIG_BASE_NAME}.{ext}"));
        if existing.exists() {
            return Ok(existing);
        }
    }

    let path = dir.join(format!("{CONFIG_BASE_NAME}.toml"));
    fs::write(&path, STARTER_CONFIG)?;
    Ok(path)
}
