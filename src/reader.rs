//! Per-container stream reader.
//!
//! A [`StreamReader`] owns one container's log stream for its whole life:
//! it opens the stream, splits it into lines, renders each line with the shared
//! [`LineFormatter`] and writes it to the shared [`LineSink`]. Every await point
//! races the run-wide [`CancellationToken`], so a follow-mode stream with no new
//! data still unwinds as soon as shutdown begins.

use std::sync::Arc;

use dtail_core::{LineFormatter, Source, StreamOptions};
use dtail_feeds::{LogFeed, LogStream};
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;

use crate::sink::{Diagnostics, LineSink};

/// Why a reader stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// The stream ended on its own (only without follow).
    EndOfStream,
    /// Shutdown was requested.
    Cancelled,
    /// The stream could not be opened; reported on diagnostics.
    OpenFailed,
    /// The stream failed mid-read; reported on diagnostics.
    ReadFailed,
    /// The output sink rejected a write; reported on diagnostics.
    SinkFailed,
}

/// Everything one reader needs, bundled so the coordinator can spawn it.
#[derive(Debug, Clone)]
pub struct StreamReader {
    source: Source,
    opts: StreamOptions,
    formatter: Arc<LineFormatter>,
    sink: LineSink,
    diagnostics: Diagnostics,
    cancel: CancellationToken,
}

impl StreamReader {
    pub fn new(
        source: Source,
        opts: StreamOptions,
        formatter: Arc<LineFormatter>,
        sink: LineSink,
        diagnostics: Diagnostics,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            opts,
            formatter,
            sink,
            diagnostics,
            cancel,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Open the stream from `feed` and pump it until it ends, fails, or the
    /// run is cancelled. Never panics on stream faults and never cancels other
    /// readers.
    pub async fn run<F: LogFeed>(self, feed: &F) -> ReaderExit {
        let source_id = self.source.id.as_str();

        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::debug!(source_id, "cancelled before stream opened");
                return ReaderExit::Cancelled;
            }
            opened = feed.open_log_stream(&self.source, &self.opts) => opened,
        };

        let stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                self.diagnostics.open_failed(source_id, &e);
                return ReaderExit::OpenFailed;
            }
        };

        tracing::info!(source_id, name = %self.source.display_name, "streaming");
        let exit = self.pump(stream).await;
        tracing::info!(source_id, ?exit, "reader stopped");
        exit
    }

    /// Read lines until the stream ends. The stream is dropped on return,
    /// closing the underlying connection.
    async fn pump(&self, mut stream: LogStream) -> ReaderExit {
        let source_id = self.source.id.as_str();
        let mut buf = Vec::with_capacity(512);

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return ReaderExit::Cancelled,
                read = stream.read_until(b'\n', &mut buf) => read,
            };

            match read {
                Ok(0) => return ReaderExit::EndOfStream,
                Ok(_) => {
                    let raw = String::from_utf8_lossy(strip_newline(&buf));
                    let line = self.formatter.format(&self.source, &raw);
                    if let Err(e) = self.sink.write_line(&line.text) {
                        self.diagnostics.write_failed(source_id, &e);
                        return ReaderExit::SinkFailed;
                    }
                }
                Err(e) => {
                    self.diagnostics.read_failed(source_id, &e);
                    return ReaderExit::ReadFailed;
                }
            }
        }
    }
}

fn strip_newline(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n").unwrap_or(line)
}
