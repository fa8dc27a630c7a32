//! Log emitter
//!
//! Composes the severity gate and the transformation engine: every admitted
//! call becomes exactly one JSON line on the sink routed for its severity.

use crate::envelope::LogEnvelope;
use crate::gate::is_enabled;
use crate::sink::SinkSet;
use crate::transform::{ErrorDetail, Transform};
use crate::value::{iso_timestamp, ErrorValue, Value};
use chrono::Utc;
use jlog_common::{JlogError, Result, Severity};
use jlog_config::LoggerConfig;

/// Structured JSON logger
///
/// Owns its configuration and its transformation engine; nothing is shared
/// with other loggers except the underlying output streams.
pub struct Logger {
    config: LoggerConfig,
    threshold: Severity,
    transform: Transform,
    sinks: SinkSet,
}

impl Logger {
    /// Build a logger using `config.level` as the threshold setting
    pub fn new(config: LoggerConfig) -> Self {
        let threshold = config.threshold();
        let transform = Transform::new(config.transform.clone());
        tracing::debug!(%threshold, "logger created");
        Self {
            config,
            threshold,
            transform,
            sinks: SinkSet::standard(),
        }
    }

    /// Build a logger whose threshold comes from `LOGLEVEL`, read once here
    pub fn from_env(config: LoggerConfig) -> Self {
        Self::new(config.with_env_level())
    }

    /// Replace the output sinks
    pub fn with_sinks(mut self, sinks: SinkSet) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// The engine, for callers that want transformed values without logging
    pub fn transformer(&self) -> &Transform {
        &self.transform
    }

    pub fn is_enabled(&self, level: Severity) -> bool {
        is_enabled(self.threshold, level)
    }

    /// Build the envelope for a call, or `None` when the gate rejects it
    pub fn envelope(
        &self,
        level: Severity,
        message: &Value,
        error: Option<&ErrorValue>,
    ) -> Option<LogEnvelope> {
        if !self.is_enabled(level) {
            return None;
        }

        let correlation = self
            .config
            .print_correlation
            .then(|| self.config.correlation_text().to_string());

        Some(LogEnvelope {
            timestamp: iso_timestamp(&Utc::now()),
            level,
            message: self.transform.transform(message),
            correlation,
            error: error.map(ErrorDetail::from),
        })
    }

    /// Write one line for the call; returns whether anything was written
    ///
    /// Sink failures are returned to the caller untouched.
    pub fn emit(
        &self,
        level: Severity,
        message: &Value,
        error: Option<&ErrorValue>,
    ) -> Result<bool> {
        let Some(envelope) = self.envelope(level, message, error) else {
            return Ok(false);
        };
        let line = envelope.to_line()?;
        self.sinks
            .get(level)
            .write_line(&line)
            .map_err(|source| JlogError::SinkError { level, source })?;
        Ok(true)
    }

    /// Log at `level`; never fails or panics
    ///
    /// A failed write is reported on the diagnostics channel instead.
    pub fn log(&self, level: Severity, message: impl Into<Value>, error: Option<&ErrorValue>) {
        let message = message.into();
        if let Err(e) = self.emit(level, &message, error) {
            tracing::warn!("Failed to write log line: {}", e);
        }
    }

    pub fn debug(&self, message: impl Into<Value>, error: Option<&ErrorValue>) {
        self.log(Severity::Debug, message, error);
    }

    pub fn info(&self, message: impl Into<Value>, error: Option<&ErrorValue>) {
        self.log(Severity::Info, message, error);
    }

    pub fn warn(&self, message: impl Into<Value>, error: Option<&ErrorValue>) {
        self.log(Severity::Warn, message, error);
    }

    pub fn error(&self, message: impl Into<Value>, error: Option<&ErrorValue>) {
        self.log(Severity::Error, message, error);
    }

    pub fn crit(&self, message: impl Into<Value>, error: Option<&ErrorValue>) {
        self.log(Severity::Crit, message, error);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}
