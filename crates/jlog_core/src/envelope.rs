//! One log line
//!
//! Field order on the wire is the declaration order below:
//! `timestamp`, `level`, `message`, then `correlation` and `[Error]` when present.

use crate::transform::{ErrorDetail, Transformed};
use jlog_common::{Result, Severity};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEnvelope {
    pub timestamp: String,
    pub level: Severity,
    pub message: Transformed,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation: Option<String>,
    #[serde(rename = "[Error]", skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl LogEnvelope {
    /// Serialize to a single JSON line, without the trailing newline
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
