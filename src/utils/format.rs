//! Table formatting and output utilities
//!
//! This module provides functionality for formatting and displaying
//! tabular data with color support and various output formats.

use clap::ValueEnum;
use crossterm::{
    style::{Color as CrosstermColor, Stylize},
    terminal::size,
};
use serde::Serialize;
use tabled::{
    settings::{object::Rows, Alignment, Color, Modify, Padding, Style, Width},
    Table, Tabled,
};

use crate::error::{Result, WeftConfigError};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
    Raw,
}

/// Color theme for console output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub header: CrosstermColor,
    pub success: CrosstermColor,
    pub warning: CrosstermColor,
    pub error: CrosstermColor,
    pub info: CrosstermColor,
    pub accent: CrosstermColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            header: CrosstermColor::Blue,
            success: CrosstermColor::Green,
            warning: CrosstermColor::Yellow,
            error: CrosstermColor::Red,
            info: CrosstermColor::Cyan,
            accent: CrosstermColor::Magenta,
        }
    }
}

/// Table formatter with color support
pub struct TableFormatter {
    format: OutputFormat,
    no_color: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        Self { format, no_color }
    }

    /// Create a formatted table from data
    pub fn format_table<T: Tabled + Serialize>(&self, data: &[T]) -> Result<String> {
        if data.is_empty() {
            return Ok("No data to display".to_string());
        }

        match self.format {
            OutputFormat::Table => self.format_as_table(data),
            OutputFormat::Json => self.format_as_json(data),
            OutputFormat::Yaml => self.format_as_yaml(data),
            OutputFormat::Raw => self.format_as_raw(data),
        }
    }

    /// Format data as a styled table
    fn format_as_table<T: Tabled>(&self, data: &[T]) -> Result<String> {
        let mut table = Table::new(data);

        // Apply styling
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Padding::new(1, 1, 0, 0));

        // Apply color if enabled
        if !self.no_color {
            table.with(Modify::new(Rows::first()).with(Color::FG_BLUE));
        }

        // Auto-adjust width to terminal
        if let Ok((width, _)) = size() {
            table.with(Width::wrap(width as usize));
        }

        Ok(table.to_string())
    }

    /// Format data as JSON
    fn format_as_json<T: Serialize>(&self, data: &[T]) -> Result<String> {
        let json = serde_json::to_string_pretty(data)?;
        Ok(json)
    }

    /// Format data as YAML
    fn format_as_yaml<T: Serialize>(&self, data: &[T]) -> Result<String> {
        serde_yaml::to_string(data).map_err(|e| WeftConfigError::serialization(e.to_string()))
    }

    /// Format data as raw text
    fn format_as_raw<T: Tabled>(&self, data: &[T]) -> Result<String> {
        let mut table = Table::new(data);
        table.with(Style::empty());
        Ok(table.to_string())
    }
}

/// Display utilities for console messages
pub struct DisplayUtils {
    theme: ColorTheme,
    no_color: bool,
}

impl DisplayUtils {
    /// Create new display utilities
    pub fn new(no_color: bool) -> Self {
        Self {
            theme: ColorTheme::default(),
            no_color,
        }
    }

    /// Print a section header
    pub fn print_header(&self, title: &str) {
        if self.no_color {
            println!("=== {} ===", title);
        } else {
            println!("=== {} ===", title.with(self.theme.header).bold());
        }
    }

    /// Print a success message
    pub fn print_success(&self, message: &str) {
        if self.no_color {
            println!("✓ {}", message);
        } else {
            println!("✓ {}", message.with(self.theme.success));
        }
    }

    /// Print a warning message
    pub fn print_warning(&self, message: &str) {
        if self.no_color {
            println!("⚠ {}", message);
        } else {
            println!("⚠ {}", message.with(self.theme.warning));
        }
    }

    /// Print an error message
    pub fn print_error(&self, message: &str) {
        if self.no_color {
            eprintln!("✗ {}", message);
        } else {
            eprintln!("✗ {}", message.with(self.theme.error));
        }
    }

    /// Print an info message
    pub fn print_info(&self, message: &str) {
        if self.no_color {
            println!("ℹ {}", message);
        } else {
            println!("ℹ {}", message.with(self.theme.info));
        }
    }

    /// Format key-value pairs
    pub fn format_key_value_pairs(&self, pairs: &[(&str, &str)]) -> String {
        let max_key_length = pairs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

        pairs
            .iter()
            .map(|(key, value)| {
                let formatted_key = if self.no_color {
                    format!("{:width$}", key, width = max_key_length)
                } else {
                    format!(
                        "{:width$}",
                        key.with(self.theme.accent).bold(),
                        width = max_key_length
                    )
                };
                format!("{}: {}", formatted_key, value)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
