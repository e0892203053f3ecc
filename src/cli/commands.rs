//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, subcommands, and their arguments.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use crate::config::{
    find_config_file, init_starter_config, load_config, ConfigFileSearch, Phase, WeftConfig,
    CONFIG_BASE_NAME,
};
use crate::error::Result;
use crate::utils::format::{DisplayUtils, OutputFormat, TableFormatter};

/// Get the full version string with build information
fn get_version() -> &'static str {
    env!("VERSION_WITH_GIT")
}

/// Get build information for display
pub fn get_build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_number: env!("BUILD_NUMBER"),
        git_hash: env!("GIT_HASH"),
        git_branch: env!("GIT_BRANCH"),
        build_time: env!("BUILD_TIME"),
        full_version: env!("FULL_VERSION"),
    }
}

#[derive(Debug)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_number: &'static str,
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    pub build_time: &'static str,
    pub full_version: &'static str,
}

#[derive(Parser)]
#[command(name = "weftc")]
#[command(about = "Configuration inspector for the weft web framework")]
#[command(version = get_version(), author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the fully resolved configuration
    Show {
        /// Project directory (defaults to the current directory)
        dir: Option<PathBuf>,
        /// Lifecycle phase to resolve for
        #[arg(long, default_value = "development-server")]
        phase: String,
    },
    /// Validate the configuration and report the outcome
    Check {
        /// Project directory (defaults to the current directory)
        dir: Option<PathBuf>,
        /// Lifecycle phase to resolve for
        #[arg(long, default_value = "development-server")]
        phase: String,
    },
    /// Show which configuration file would be used
    Path {
        /// Project directory (defaults to the current directory)
        dir: Option<PathBuf>,
    },
    /// Write a starter configuration file
    Init {
        /// Project directory (defaults to the current directory)
        dir: Option<PathBuf>,
    },
    /// Show detailed version and build information
    Version,
}

impl Cli {
    /// Execute the parsed command
    pub fn execute(self) -> Result<()> {
        let display = DisplayUtils::new(self.no_color);
        match self.command {
            Commands::Show { dir, phase } => {
                execute_show(dir, &phase, self.format, self.no_color)
            }
            Commands::Check { dir, phase } => execute_check(dir, &phase, &display),
            Commands::Path { dir } => execute_path(dir, &display),
            Commands::Init { dir } => execute_init(dir, &display),
            Commands::Version => execute_version(),
        }
    }
}

fn project_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

#[derive(Tabled, Serialize)]
struct ConfigItem {
    #[tabled(rename = "Setting")]
    setting: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

fn config_rows(config: &WeftConfig) -> Result<Vec<ConfigItem>> {
    let table = config.to_table()?;
    let defaults = WeftConfig::default().to_table()?;

    let mut items = Vec::new();
    for (setting, value) in &table {
        let source = if defaults.get(setting) == Some(value) {
            "default".to_string()
        } else {
            config.config_origin.clone()
        };
        items.push(ConfigItem {
            setting: setting.clone(),
            value: render_value(value),
            source,
        });
    }
    Ok(items)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.is_empty() => "<not set>".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn execute_show(
    dir: Option<PathBuf>,
    phase: &str,
    format: OutputFormat,
    no_color: bool,
) -> Result<()> {
    let dir = project_dir(dir)?;
    let phase = Phase::from_str(phase)?;
    let config = load_config(phase, &dir, None)?;

    let items = config_rows(&config)?;
    let formatter = TableFormatter::new(format, no_color);
    println!("{}", formatter.format_table(&items)?);
    Ok(())
}

fn execute_check(dir: Option<PathBuf>, phase: &str, display: &DisplayUtils) -> Result<()> {
    let dir = project_dir(dir)?;
    let phase = Phase::from_str(phase)?;
    let config = load_config(phase, &dir, None)?;

    display.print_success(&format!(
        "Configuration is valid (origin: {})",
        config.config_origin
    ));
    display.print_info(&format!(
        "target: {}, dist_dir: {}",
        config.target, config.dist_dir
    ));
    Ok(())
}

fn execute_path(dir: Option<PathBuf>, display: &DisplayUtils) -> Result<()> {
    let dir = project_dir(dir)?;
    match find_config_file(&dir) {
        ConfigFileSearch::Found(path) => println!("{}", path.display()),
        ConfigFileSearch::Unsupported(path) => {
            display.print_warning(&format!(
                "Found '{}', but its format is not supported. Replace it with \
                 '{CONFIG_BASE_NAME}.toml' or '{CONFIG_BASE_NAME}.json'.",
                path.display()
            ));
        }
        ConfigFileSearch::NotFound => {
            display.print_info("No configuration file found; the defaults will be used.");
        }
    }
    Ok(())
}

fn execute_init(dir: Option<PathBuf>, display: &DisplayUtils) -> Result<()> {
    let dir = project_dir(dir)?;
    let existed = ["toml", "json"]
        .iter()
        .any(|ext| dir.join(format!("{CONFIG_BASE_NAME}.{ext}")).exists());
    let path = init_starter_config(&dir)?;

    if existed {
        display.print_info(&format!(
            "Configuration file already exists at {}",
            path.display()
        ));
    } else {
        display.print_success(&format!("Wrote starter configuration to {}", path.display()));
    }
    Ok(())
}

fn execute_version() -> Result<()> {
    let build_info = get_build_info();

    println!("weft-config");
    println!("===========");
    println!("Version:      {}", build_info.version);
    println!("Build:        {}", build_info.build_number);
    println!("Full Version: {}", build_info.full_version);
    println!("Git Hash:     {}", build_info.git_hash);
    println!("Git Branch:   {}", build_info.git_branch);
    println!("Built:        {}", build_info.build_time);

    Ok(())
}
