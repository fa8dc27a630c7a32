//! Capturing sinks
//!
//! Stand-ins for stdout/stderr that keep every written line in memory so
//! tests can count writes per severity and parse the JSON back.

use jlog_core::{Severity, Sink, SinkSet};
use std::io;
use std::sync::{Arc, Mutex};

/// Sink that stores each written line
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink poisoned"))?
            .push(line.to_string());
        Ok(())
    }
}

/// One [`MemorySink`] per severity
///
/// # Example
///
/// ```rust
/// use jlog_test_helpers::capture::CapturedSinks;
/// use jlog_core::Severity;
///
/// let captured = CapturedSinks::new();
/// assert_eq!(captured.count(Severity::Debug), 0);
/// ```
#[derive(Debug, Clone)]
pub struct CapturedSinks {
    sinks: [Arc<MemorySink>; 5],
}

impl CapturedSinks {
    pub fn new() -> Self {
        Self {
            sinks: std::array::from_fn(|_| Arc::new(MemorySink::new())),
        }
    }

    /// Routing that sends each severity to its own memory sink
    pub fn sink_set(&self) -> SinkSet {
        Severity::ALL
            .into_iter()
            .fold(SinkSet::standard(), |set, level| {
                let sink: Arc<dyn Sink> = self.sinks[level.rank() as usize].clone();
                set.route(level, sink)
            })
    }

    pub fn sink(&self, level: Severity) -> &MemorySink {
        &self.sinks[level.rank() as usize]
    }

    pub fn count(&self, level: Severity) -> usize {
        self.sink(level).len()
    }

    pub fn total(&self) -> usize {
        Severity::ALL.into_iter().map(|l| self.count(l)).sum()
    }

    /// Every line written at `level`, parsed as JSON
    pub fn parsed(&self, level: Severity) -> Vec<serde_json::Value> {
        self.sink(level)
            .lines()
            .iter()
            .map(|line| {
                serde_json::from_str(line)
                    .unwrap_or_else(|e| panic!("Line is not valid JSON ({}): {}", e, line))
            })
            .collect()
    }

    /// The only line written at `level`, parsed as JSON
    ///
    /// Panics unless exactly one line was written.
    pub fn single(&self, level: Severity) -> serde_json::Value {
        let mut parsed = self.parsed(level);
        assert_eq!(parsed.len(), 1, "Expected exactly one {} line", level);
        parsed.remove(0)
    }
}

impl Default for CapturedSinks {
    fn default() -> Self {
        Self::new()
    }
}
