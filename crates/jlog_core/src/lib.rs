//! # jlog core
//!
//! Structured JSON logging for values of any shape.
//!
//! ## Architecture
//!
//! - **Value model**: [`Value`], a dynamic value with shared, possibly cyclic composites
//! - **Transformation engine**: [`Transform`], total rewrite into JSON-safe [`Transformed`]
//! - **Severity gate**: [`gate::is_enabled`], CRIT is never silenced
//! - **Emitter**: [`Logger`], one JSON line per admitted call on a severity-routed [`Sink`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jlog_core::{Logger, LoggerConfig, Value, ErrorValue};
//!
//! let log = Logger::from_env(LoggerConfig {
//!     correlation_id: Some("req-42".to_string()),
//!     ..Default::default()
//! });
//!
//! log.warn(Value::map([("attempt", 3)]), None);
//! log.error("upload failed", Some(&ErrorValue::new("connection reset")));
//! ```

pub mod cycle;
pub mod envelope;
pub mod gate;
pub mod inspect;
pub mod logger;
pub mod sink;
pub mod transform;
pub mod value;

pub use envelope::LogEnvelope;
pub use jlog_common::{JlogError, Result, Severity};
pub use jlog_config::{InspectOptions, LoggerConfig, TransformConfig};
pub use logger::Logger;
pub use sink::{Sink, SinkSet, StderrSink, StdoutSink, WriterSink};
pub use transform::{CollectionKind, ErrorDetail, Record, Transform, Transformed};
pub use value::{ArrayRef, ErrorValue, MapRef, ObjectRef, SetRef, Value};
