//! Shared test utilities for jlog test suites
//!
//! # Modules
//!
//! - [`capture`]: In-memory sinks that record emitted lines per severity
//! - [`workspace`]: Temporary directories holding config files
//! - [`logging`]: Capture of jlog's own diagnostics
//! - [`assertions`]: Predicates for log lines
//!
//! # Example
//!
//! ```rust
//! use jlog_test_helpers::prelude::*;
//! use jlog_core::{Logger, LoggerConfig, Severity};
//!
//! let captured = CapturedSinks::new();
//! let log = Logger::new(LoggerConfig::default()).with_sinks(captured.sink_set());
//! log.warn("hello", None);
//!
//! let line = captured.single(Severity::Warn);
//! assert_eq!(line["message"], "hello");
//! ```

pub mod assertions;
pub mod capture;
pub mod logging;
pub mod workspace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::capture::{CapturedSinks, MemorySink};
    pub use crate::logging::capture_diagnostics;
    pub use crate::workspace::{config_file, temp_dir};
}
