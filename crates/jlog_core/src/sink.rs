//! Output sinks
//!
//! A sink writes one finished line per call, synchronously and untouched.
//! Each line goes out in a single `write_all` under the stream lock, so
//! concurrent callers never interleave partial lines.

use jlog_common::Severity;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Destination for finished log lines
pub trait Sink: Send + Sync {
    fn write_line(&self, line: &str) -> io::Result<()>;
}

fn with_newline(line: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    buf
}

/// Standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(&with_newline(line))?;
        out.flush()
    }
}

/// Standard error
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut err = io::stderr().lock();
        err.write_all(&with_newline(line))?;
        err.flush()
    }
}

/// Any `io::Write` behind a mutex (files, sockets, buffers)
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "sink writer poisoned"))?;
        writer.write_all(&with_newline(line))?;
        writer.flush()
    }
}

/// One sink per severity
#[derive(Clone)]
pub struct SinkSet {
    sinks: [Arc<dyn Sink>; 5],
}

impl SinkSet {
    /// DEBUG and INFO to stdout, WARN, ERROR and CRIT to stderr
    pub fn standard() -> Self {
        let out: Arc<dyn Sink> = Arc::new(StdoutSink);
        let err: Arc<dyn Sink> = Arc::new(StderrSink);
        Self {
            sinks: [out.clone(), out, err.clone(), err.clone(), err],
        }
    }

    /// The same sink for every severity
    pub fn uniform(sink: Arc<dyn Sink>) -> Self {
        Self {
            sinks: std::array::from_fn(|_| sink.clone()),
        }
    }

    /// Replace the sink for one severity
    pub fn route(mut self, level: Severity, sink: Arc<dyn Sink>) -> Self {
        self.sinks[level.rank() as usize] = sink;
        self
    }

    pub fn get(&self, level: Severity) -> &Arc<dyn Sink> {
        &self.sinks[level.rank() as usize]
    }
}

impl Default for SinkSet {
    fn default() -> Self {
        Self::standard()
    }
}
