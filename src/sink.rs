//! Serialized output destinations.
//!
//! Every reader shares one [`LineSink`] for log lines and one [`Diagnostics`]
//! handle for per-source errors. Each call takes the sink's lock for exactly one
//! complete line, so lines from different containers never interleave.

use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable handle to a mutex-guarded writer.
#[derive(Clone)]
pub struct LineSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl LineSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Write `line` followed by `\n` as a single locked write, then flush.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        let mut writer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&buf)?;
        writer.flush()
    }
}

impl std::fmt::Debug for LineSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSink").finish_non_exhaustive()
    }
}

/// User-facing error channel, kept apart from the log-line sink.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    sink: LineSink,
}

impl Diagnostics {
    pub fn new(sink: LineSink) -> Self {
        Self { sink }
    }

    pub fn stderr() -> Self {
        Self::new(LineSink::stderr())
    }

    /// A run-level failure (usage or resolution).
    pub fn fatal(&self, err: &dyn Display) {
        self.emit(&format!("error: {err}"));
    }

    /// A container's log stream could not be opened.
    pub fn open_failed(&self, source_id: &str, err: &dyn Display) {
        tracing::warn!(source_id, error = %err, "log stream open failed");
        self.emit(&format!("error retrieving logs for container {source_id}: {err}"));
    }

    /// A container's log stream failed after it was opened.
    pub fn read_failed(&self, source_id: &str, err: &dyn Display) {
        tracing::warn!(source_id, error = %err, "log stream read failed");
        self.emit(&format!("error reading logs from container {source_id}: {err}"));
    }

    /// The line output sink rejected a write for a container.
    pub fn write_failed(&self, source_id: &str, err: &dyn Display) {
        tracing::warn!(source_id, error = %err, "output sink write failed");
        self.emit(&format!("error writing logs from container {source_id}: {err}"));
    }

    /// Control-character stripping is unavailable; lines pass through as-is.
    pub fn sanitizer_unavailable(&self, err: &dyn Display) {
        tracing::warn!(error = %err, "control-character pattern unavailable");
        self.emit(&format!("warning: control characters will not be stripped: {err}"));
    }

    fn emit(&self, line: &str) {
        // Nowhere left to report to if stderr itself is gone.
        if let Err(e) = self.sink.write_line(line) {
            tracing::error!(error = %e, "diagnostics sink write failed");
        }
    }
}
