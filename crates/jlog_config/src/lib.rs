//! Configuration management for jlog
//!
//! This crate handles loading logger settings from TOML and reading the
//! `LOGLEVEL` threshold from the environment.

use jlog_common::{Result, Severity, LOG_LEVEL_ENV, UNDEFINED_CORRELATION};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main logger configuration
///
/// Constructed once per `Logger` and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Minimum level name, resolved with [`resolve_threshold`]
    #[serde(default)]
    pub level: Option<String>,

    /// Correlation identifier attached to every line
    #[serde(default)]
    pub correlation_id: Option<String>,

    /// Emit the `correlation` field
    #[serde(default = "default_true")]
    pub print_correlation: bool,

    /// Transformation settings ([transform])
    #[serde(default)]
    pub transform: TransformConfig,
}

fn default_true() -> bool {
    true
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: None,
            correlation_id: None,
            print_correlation: true,
            transform: TransformConfig::default(),
        }
    }
}

/// Transformation configuration ([transform])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransformConfig {
    /// Wrap map-like values in `{"[Map]": ..}` and set-like values in `{"[Set]": ..}`
    #[serde(default)]
    pub print_collection_type_markers: bool,

    /// Options for the textual inspector used by the circular-reference fallback
    #[serde(default)]
    pub inspect: InspectOptions,
}

/// Inspector options ([transform.inspect])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectOptions {
    #[serde(default)]
    pub show_hidden: bool,

    /// Nesting depth rendered before collapsing to `[Object]`; `None` is unbounded
    #[serde(default = "default_depth")]
    pub depth: Option<usize>,

    #[serde(default)]
    pub colors: bool,
}

fn default_depth() -> Option<usize> {
    Some(2)
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            show_hidden: false,
            depth: default_depth(),
            colors: false,
        }
    }
}

impl LoggerConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: LoggerConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Replace `level` with the current value of `LOGLEVEL`
    ///
    /// An unset variable clears the level, so the default threshold applies.
    pub fn with_env_level(mut self) -> Self {
        self.level = std::env::var(LOG_LEVEL_ENV).ok();
        self
    }

    /// Effective minimum severity
    pub fn threshold(&self) -> Severity {
        resolve_threshold(self.level.as_deref())
    }

    /// Correlation text as written to the log line
    pub fn correlation_text(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or(UNDEFINED_CORRELATION)
    }
}

/// Resolve a level setting to the minimum severity
///
/// Absent or unrecognized names fall back to [`Severity::DEFAULT_THRESHOLD`].
pub fn resolve_threshold(setting: Option<&str>) -> Severity {
    match setting {
        None => Severity::DEFAULT_THRESHOLD,
        Some(name) => name.parse().unwrap_or_else(|e| {
            tracing::debug!("{}, falling back to {}", e, Severity::DEFAULT_THRESHOLD);
            Severity::DEFAULT_THRESHOLD
        }),
    }
}

/// Read the threshold from `LOGLEVEL`
pub fn threshold_from_env() -> Severity {
    resolve_threshold(std::env::var(LOG_LEVEL_ENV).ok().as_deref())
}
