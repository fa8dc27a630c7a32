//! Common types and errors for jlog
//!
//! This crate provides the severity table and error types shared by all jlog components.

pub mod severity;
pub mod telemetry;

pub use severity::{ParseSeverityError, Severity};

use thiserror::Error;

/// Core error types for jlog operations
#[derive(Error, Debug)]
pub enum JlogError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to parse config: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Sink write failed for {level}: {source}")]
    SinkError {
        level: Severity,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, JlogError>;

/// Name of the environment setting holding the minimum level
pub const LOG_LEVEL_ENV: &str = "LOGLEVEL";

/// Text used for the correlation field when no identifier was configured
pub const UNDEFINED_CORRELATION: &str = "undefined";
