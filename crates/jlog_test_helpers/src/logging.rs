//! Test logging utilities
//!
//! jlog reports its own trouble (a sink that refused a line, a bad level
//! setting) through `tracing`. These helpers install a scoped subscriber so a
//! test can read back what was reported without touching the global one.

use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Shared in-memory buffer the scoped subscriber writes into
#[derive(Clone, Default)]
struct DiagnosticsBuffer(Arc<Mutex<Vec<u8>>>);

impl DiagnosticsBuffer {
    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for DiagnosticsBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for DiagnosticsBuffer {
    type Writer = DiagnosticsBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a subscriber at `level` installed for the current thread and
/// return everything it reported
///
/// # Example
///
/// ```rust
/// use jlog_test_helpers::logging::capture_diagnostics;
///
/// let text = capture_diagnostics("warn", || tracing::warn!("disk full"));
/// assert!(text.contains("disk full"));
/// ```
pub fn capture_diagnostics<F: FnOnce()>(level: &str, f: F) -> String {
    let buffer = DiagnosticsBuffer::default();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(buffer.clone())
        .with_ansi(false)
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    buffer.contents()
}
