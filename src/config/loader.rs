//! Configuration loading pipeline
//!
//! This module wires discovery, normalization, validation, and merging
//! into the single entry point the rest of the framework calls. Loading is
//! fully synchronous: the only I/O is a blocking directory walk and a
//! blocking file read.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::resolve::{find_config_file, ConfigFileSearch};
use crate::config::settings::{
    ExperimentalConfig, ReactMode, Target, WeftConfig, CONFIG_BASE_NAME, RESERVED_STATIC_DIR,
};
use crate::error::{Result, WeftConfigError};

/// Lifecycle stage configuration is being loaded for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    DevelopmentServer,
    ProductionBuild,
    ProductionServer,
    Export,
}

impl Phase {
    /// Every accepted phase tag, for error messages
    pub const VALID: [&'static str; 4] = [
        "development-server",
        "production-build",
        "production-server",
        "export",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::DevelopmentServer => "development-server",
            Phase::ProductionBuild => "production-build",
            Phase::ProductionServer => "production-server",
            Phase::Export => "export",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = WeftConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development-server" => Ok(Phase::DevelopmentServer),
            "production-build" => Ok(Phase::ProductionBuild),
            "production-server" => Ok(Phase::ProductionServer),
            "export" => Ok(Phase::Export),
            other => Err(WeftConfigError::invalid_argument(format!(
                "unknown phase '{other}', expected one of: {}",
                Phase::VALID.join(", ")
            ))),
        }
    }
}

/// Helpers handed to a configuration factory alongside the phase
pub struct ConfigContext {
    pub default_config: WeftConfig,
}

/// A user configuration export.
///
/// Configuration files always produce the `Value` variant. Programmatic
/// configuration may instead supply a factory, invoked once per load with
/// the phase and a context carrying the defaults. The factory returns the
/// table directly, so deferred or asynchronous configuration is
/// unrepresentable.
pub enum ConfigExport {
    Value(Map<String, Value>),
    Factory(Box<dyn Fn(Phase, &ConfigContext) -> Map<String, Value> + Send + Sync>),
}

impl ConfigExport {
    /// Wrap a JSON value, which must be a table
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(ConfigExport::Value(map)),
            other => Err(WeftConfigError::config(format!(
                "inline configuration must be a table, got {other}"
            ))),
        }
    }

    /// Wrap a configuration factory
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(Phase, &ConfigContext) -> Map<String, Value> + Send + Sync + 'static,
    {
        ConfigExport::Factory(Box::new(f))
    }

    fn resolve(self, phase: Phase, context: &ConfigContext) -> Map<String, Value> {
        match self {
            ConfigExport::Value(table) => table,
            ConfigExport::Factory(factory) => factory(phase, context),
        }
    }
}

/// Loads and merges weft configuration.
///
/// Each loader owns its own experimental-features warning flag, so
/// independent loaders (as tests construct) warn independently. The
/// [`load_config`] free function routes every call through one shared
/// loader, which is what gives the warning its once-per-process behavior.
pub struct ConfigLoader {
    experimental_warned: AtomicBool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            experimental_warned: AtomicBool::new(false),
        }
    }

    /// Resolve the configuration for `dir` at the given phase.
    ///
    /// When `inline_config` is supplied it is used directly with origin
    /// `server` and no filesystem lookup happens. Otherwise the directory
    /// tree is searched for a configuration file; with nothing found the
    /// defaults are returned unchanged.
    pub fn load(
        &self,
        phase: Phase,
        dir: &Path,
        inline_config: Option<ConfigExport>,
    ) -> Result<WeftConfig> {
        let defaults = WeftConfig::default();

        if let Some(export) = inline_config {
            let context = ConfigContext {
                default_config: defaults.clone(),
            };
            let table = export.resolve(phase, &context);
            return self.assign(table, "server".to_string(), &defaults);
        }

        match find_config_file(dir) {
            ConfigFileSearch::NotFound => Ok(defaults),
            ConfigFileSearch::Unsupported(path) => Err(WeftConfigError::UnsupportedConfigFile {
                path,
                base: CONFIG_BASE_NAME,
            }),
            ConfigFileSearch::Found(path) => {
                let table = read_config_table(&path)?;
                let origin = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                debug!(phase = %phase, "loaded configuration from {}", path.display());
                self.assign(table, origin, &defaults)
            }
        }
    }

    /// Whether this loader has already surfaced the experimental warning
    pub fn experimental_warned(&self) -> bool {
        self.experimental_warned.load(Ordering::Relaxed)
    }

    fn assign(
        &self,
        mut user: Map<String, Value>,
        origin: String,
        defaults: &WeftConfig,
    ) -> Result<WeftConfig> {
        validate_user_config(&mut user)?;
        self.warn_on_experimental(&user);

        let mut merged = merge_user_config(defaults.to_table()?, user);
        merged.insert("config_origin".to_string(), Value::String(origin));

        serde_json::from_value(Value::Object(merged))
            .map_err(|e| WeftConfigError::config(format!("invalid configuration value: {e}")))
    }

    fn warn_on_experimental(&self, user: &Map<String, Value>) {
        let Some(Value::Object(user_experimental)) = user.get("experimental") else {
            return;
        };
        let Ok(Value::Object(default_experimental)) =
            serde_json::to_value(ExperimentalConfig::default())
        else {
            return;
        };

        let non_default = user_experimental
            .iter()
            .any(|(key, value)| default_experimental.get(key) != Some(value));
        if non_default && !self.experimental_warned.swap(true, Ordering::Relaxed) {
            warn!(
                "experimental features are enabled; they are not covered by semver \
                 and may change or be removed at any time"
            );
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

static SHARED_LOADER: OnceLock<ConfigLoader> = OnceLock::new();

/// Load configuration through the process-wide loader.
///
/// All calls in a process share one experimental-features warning, so it
/// prints at most once no matter how often configuration is reloaded.
pub fn load_config(
    phase: Phase,
    dir: &Path,
    inline_config: Option<ConfigExport>,
) -> Result<WeftConfig> {
    SHARED_LOADER
        .get_or_init(ConfigLoader::new)
        .load(phase, dir, inline_config)
}

/// Read a configuration file into the JSON table model
fn read_config_table(path: &Path) -> Result<Map<String, Value>> {
    let contents = fs::read_to_string(path)?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let value: Value = match extension {
        "toml" => {
            let parsed: toml::Value = toml::from_str(&contents)
                .map_err(|e| WeftConfigError::parse(path.to_path_buf(), e.to_string()))?;
            serde_json::to_value(parsed)
                .map_err(|e| WeftConfigError::parse(path.to_path_buf(), e.to_string()))?
        }
        "json" => serde_json::from_str(&contents)
            .map_err(|e| WeftConfigError::parse(path.to_path_buf(), e.to_string()))?,
        other => {
            return Err(WeftConfigError::parse(
                path.to_path_buf(),
                format!("unrecognized extension '{other}'"),
            ))
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(WeftConfigError::parse(
            path.to_path_buf(),
            "the configuration root must be a table",
        )),
    }
}

/// Run the fixed validation sequence against the user table, normalizing
/// `amp.canonical_base` in place
fn validate_user_config(user: &mut Map<String, Value>) -> Result<()> {
    if let Some(Value::String(dist_dir)) = user.get("dist_dir") {
        if dist_dir == RESERVED_STATIC_DIR {
            return Err(WeftConfigError::reserved_dist_dir(dist_dir.clone()));
        }
    }

    let target = match user.get("target") {
        Some(Value::String(value)) => Some(Target::from_str(value)?),
        Some(other) => {
            return Err(WeftConfigError::InvalidTarget {
                value: other.to_string(),
                valid: Target::VALID.to_vec(),
            })
        }
        None => None,
    };

    if let Some(Value::Object(amp)) = user.get_mut("amp") {
        if let Some(Value::String(base)) = amp.get_mut("canonical_base") {
            if let Some(stripped) = base.strip_suffix('/') {
                *base = stripped.to_string();
            }
        }
    }

    if let Some(target) = target {
        if target != Target::Server && has_runtime_config(user) {
            return Err(WeftConfigError::RuntimeConfigWithNonServerTarget {
                target: target.to_string(),
            });
        }
    }

    if let Some(Value::Object(experimental)) = user.get("experimental") {
        match experimental.get("react_mode") {
            Some(Value::String(mode)) => {
                ReactMode::from_str(mode)?;
            }
            Some(other) if !other.is_null() => {
                return Err(WeftConfigError::InvalidReactMode {
                    value: other.to_string(),
                    valid: ReactMode::VALID.to_vec(),
                })
            }
            _ => {}
        }
    }

    Ok(())
}

fn has_runtime_config(user: &Map<String, Value>) -> bool {
    ["public_runtime_config", "server_runtime_config"]
        .iter()
        .any(|key| match user.get(*key) {
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Null) | None => false,
            Some(_) => true,
        })
}

/// Shallow-merge `user` over `defaults`.
///
/// When both sides of a key hold tables they merge key-by-key, one level
/// deep: user keys win and unmentioned default keys survive. Every other
/// value, arrays included, replaces the default outright. Null user values
/// are skipped so the defaults survive.
fn merge_user_config(
    mut defaults: Map<String, Value>,
    user: Map<String, Value>,
) -> Map<String, Value> {
    for (key, value) in user {
        if value.is_null() {
            continue;
        }
        let merged = match (defaults.remove(&key), value) {
            (Some(Value::Object(mut base)), Value::Object(overlay)) => {
                for (sub_key, sub_value) in overlay {
                    if sub_value.is_null() {
                        continue;
                    }
                    base.insert(sub_key, sub_value);
                }
                Value::Object(base)
            }
            (_, value) => value,
        };
        defaults.insert(key, merged);
    }
    defaults
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a table"),
        }
    }

    #[test]
    fn test_merge_scalar_replaces_default() {
        let defaults = table(json!({"compress": true, "dist_dir": ".weft"}));
        let user = table(json!({"compress": false}));

        let merged = merge_user_config(defaults, user);
        assert_eq!(merged["compress"], json!(false));
        assert_eq!(merged["dist_dir"], json!(".weft"));
    }

    #[test]
    fn test_merge_tables_one_level_deep() {
        let defaults = table(json!({
            "on_demand_entries": {"max_inactive_age_ms": 60000, "pages_buffer_length": 2}
        }));
        let user = table(json!({"on_demand_entries": {"max_inactive_age_ms": 5}}));

        let merged = merge_user_config(defaults, user);
        assert_eq!(
            merged["on_demand_entries"],
            json!({"max_inactive_age_ms": 5, "pages_buffer_length": 2})
        );
    }

    #[test]
    fn test_merge_arrays_replace_outright() {
        let defaults = table(json!({"page_extensions": ["html", "md"]}));
        let user = table(json!({"page_extensions": ["md"]}));

        let merged = merge_user_config(defaults, user);
        assert_eq!(merged["page_extensions"], json!(["md"]));
    }

    #[test]
    fn test_merge_skips_null_values() {
        let defaults = table(json!({"compress": true, "amp": {"canonical_base": ""}}));
        let user = table(json!({"compress": null, "amp": {"canonical_base": null}}));

        let merged = merge_user_config(defaults, user);
        assert_eq!(merged["compress"], json!(true));
        assert_eq!(merged["amp"], json!({"canonical_base": ""}));
    }

    #[test]
    fn test_merge_table_over_scalar_replaces() {
        let defaults = table(json!({"asset_prefix": ""}));
        let user = table(json!({"asset_prefix": {"cdn": "https://cdn.example.com"}}));

        let merged = merge_user_config(defaults, user);
        assert_eq!(merged["asset_prefix"], json!({"cdn": "https://cdn.example.com"}));
    }

    #[test]
    fn test_validate_rejects_reserved_dist_dir() {
        let mut user = table(json!({"dist_dir": "public"}));
        let err = validate_user_config(&mut user).unwrap_err();
        assert!(matches!(err, WeftConfigError::ReservedDistDir { .. }));
    }

    #[test]
    fn test_validate_accepts_other_dist_dir() {
        let mut user = table(json!({"dist_dir": "build"}));
        assert!(validate_user_config(&mut user).is_ok());
    }

    #[test]
    fn test_validate_strips_one_trailing_slash() {
        let mut user = table(json!({"amp": {"canonical_base": "https://x.com/"}}));
        validate_user_config(&mut user).unwrap();
        assert_eq!(user["amp"]["canonical_base"], json!("https://x.com"));

        let mut user = table(json!({"amp": {"canonical_base": "https://x.com//"}}));
        validate_user_config(&mut user).unwrap();
        assert_eq!(user["amp"]["canonical_base"], json!("https://x.com/"));
    }

    #[test]
    fn test_validate_rejects_runtime_config_for_serverless() {
        let mut user = table(json!({
            "target": "serverless",
            "public_runtime_config": {"a": 1}
        }));
        let err = validate_user_config(&mut user).unwrap_err();
        assert!(matches!(
            err,
            WeftConfigError::RuntimeConfigWithNonServerTarget { .. }
        ));
    }

    #[test]
    fn test_validate_allows_runtime_config_for_server() {
        let mut user = table(json!({
            "target": "server",
            "public_runtime_config": {"a": 1}
        }));
        assert!(validate_user_config(&mut user).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_string_target() {
        let mut user = table(json!({"target": 3}));
        let err = validate_user_config(&mut user).unwrap_err();
        assert!(matches!(err, WeftConfigError::InvalidTarget { .. }));
    }

    #[test]
    fn test_validate_rejects_unknown_react_mode() {
        let mut user = table(json!({"experimental": {"react_mode": "turbo"}}));
        let err = validate_user_config(&mut user).unwrap_err();
        assert!(matches!(err, WeftConfigError::InvalidReactMode { .. }));
    }

    #[test]
    fn test_phase_parsing() {
        assert_eq!(
            "production-build".parse::<Phase>().unwrap(),
            Phase::ProductionBuild
        );
        assert!("staging".parse::<Phase>().is_err());
    }

    #[test]
    fn test_factory_receives_phase_and_defaults() {
        let loader = ConfigLoader::new();
        let export = ConfigExport::factory(|phase, context| {
            let mut map = Map::new();
            map.insert(
                "asset_prefix".to_string(),
                Value::String(format!("/{}", phase)),
            );
            map.insert(
                "dist_dir".to_string(),
                Value::String(context.default_config.dist_dir.clone()),
            );
            map
        });

        let config = loader
            .load(Phase::Export, Path::new("."), Some(export))
            .unwrap();
        assert_eq!(config.asset_prefix, "/export");
        assert_eq!(config.dist_dir, ".weft");
        assert_eq!(config.config_origin, "server");
    }

    #[test]
    fn test_experimental_warning_fires_once_per_loader() {
        let loader = ConfigLoader::new();
        let experimental = || {
            ConfigExport::from_value(json!({"experimental": {"css": true}})).unwrap()
        };

        assert!(!loader.experimental_warned());
        loader
            .load(Phase::DevelopmentServer, Path::new("."), Some(experimental()))
            .unwrap();
        assert!(loader.experimental_warned());

        // A second load still succeeds and the flag stays set
        loader
            .load(Phase::DevelopmentServer, Path::new("."), Some(experimental()))
            .unwrap();
        assert!(loader.experimental_warned());
    }

    #[test]
    fn test_experimental_at_default_values_does_not_warn() {
        let loader = ConfigLoader::new();
        let export = ConfigExport::from_value(json!({"experimental": {"css": false}})).unwrap();

        loader
            .load(Phase::DevelopmentServer, Path::new("."), Some(export))
            .unwrap();
        assert!(!loader.experimental_warned());
    }
}
