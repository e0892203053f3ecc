use std::path::PathBuf;

use thiserror::Error;

/// Main error type for weft configuration loading
#[derive(Debug, Error)]
pub enum WeftConfigError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(
        "The 'dist_dir' setting cannot be '{dir}' because it is reserved for static assets. \
         See https://weft.rs/docs/messages/reserved-dist-dir"
    )]
    ReservedDistDir { dir: String },

    #[error(
        "Configured 'target' value '{value}' is invalid. Valid values are: {valid_list}",
        valid_list = .valid.join(", ")
    )]
    InvalidTarget { value: String, valid: Vec<&'static str> },

    #[error(
        "Configured 'experimental.react_mode' value '{value}' is invalid. \
         Valid values are: {valid_list}",
        valid_list = .valid.join(", ")
    )]
    InvalidReactMode { value: String, valid: Vec<&'static str> },

    #[error(
        "Configuring 'public_runtime_config' or 'server_runtime_config' is not supported with \
         'target: {target}'. See https://weft.rs/docs/messages/runtime-config-target"
    )]
    RuntimeConfigWithNonServerTarget { target: String },

    #[error(
        "Configuration file '{found}' is not supported. Please replace it with \
         '{base}.toml' or '{base}.json'.",
        found = .path.display()
    )]
    UnsupportedConfigFile { path: PathBuf, base: &'static str },

    #[error(
        "Failed to parse configuration file '{found}': {reason}",
        found = .path.display()
    )]
    ConfigParseError { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl WeftConfigError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn reserved_dist_dir<S: Into<String>>(dir: S) -> Self {
        Self::ReservedDistDir { dir: dir.into() }
    }

    pub fn parse<S: Into<String>>(path: PathBuf, reason: S) -> Self {
        Self::ConfigParseError {
            path,
            reason: reason.into(),
        }
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type alias for weft configuration operations
pub type Result<T> = std::result::Result<T, WeftConfigError>;
