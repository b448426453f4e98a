//! Capture buffers standing in for stdout/stderr, plus the plain formatter
//! every harness renders with.

use dtail::{Diagnostics, LineSink};
use dtail_core::{LineFormatter, Painter};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Timestamp format used by harnesses: fixed width, eight characters.
pub const TEST_TS_FORMAT: &str = "%H:%M:%S";

/// Formatter without colour so assertions can match text exactly.
pub fn plain_formatter() -> LineFormatter {
    LineFormatter::new(Painter::plain(), TEST_TS_FORMAT)
}

/// Thread-safe in-memory writer. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> LineSink {
        LineSink::new(self.clone())
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(self.sink())
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).expect("sink output is UTF-8")
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }

    /// Every individual `write` call the sink made, in order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.lock().unwrap().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        self.writes.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer whose every write fails, like stdout once the pipe reader is gone.
pub struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that blocks the calling thread for `delay` on every write, like a
/// terminal nobody is draining.
pub struct StalledWriter {
    delay: Duration,
}

impl StalledWriter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Write for StalledWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        std::thread::sleep(self.delay);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
