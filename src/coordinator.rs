//! Fan-in coordinator.
//!
//! Drives a run through its phases:
//!
//! ```text
//! Init ──► Resolving ──► Streaming ──► Draining ──► Done
//!   │          │                                     ▲
//!   └──────────┴──────────── exit 1 ─────────────────┘
//! ```
//!
//! Labels are resolved before any reader exists, so the per-source
//! [`Source`](dtail_core::Source) values handed to readers are immutable. All
//! readers share one [`CancellationToken`]; it is cancelled exactly once, on
//! entering `Draining`, whether that was triggered by the shutdown future or by
//! every reader finishing on its own.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dtail_core::label::assign_labels;
use dtail_core::sanitize;
use dtail_core::{LineFormatter, StreamOptions};
use dtail_feeds::LogFeed;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::reader::{ReaderExit, StreamReader};
use crate::sink::{Diagnostics, LineSink};

pub const EXIT_OK: i32 = 0;

/// Lifecycle phase of a run, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Resolving,
    Streaming,
    Draining,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => write!(f, "init"),
            Phase::Resolving => write!(f, "resolving"),
            Phase::Streaming => write!(f, "streaming"),
            Phase::Draining => write!(f, "draining"),
            Phase::Done => write!(f, "done"),
        }
    }
}

/// Owns the shared pieces of a run and spawns one [`StreamReader`] per source.
pub struct Coordinator<F> {
    feed: Arc<F>,
    opts: StreamOptions,
    formatter: Arc<LineFormatter>,
    sink: LineSink,
    diagnostics: Diagnostics,
    drain_timeout: Option<Duration>,
}

impl<F: LogFeed> Coordinator<F> {
    pub fn new(
        feed: Arc<F>,
        opts: StreamOptions,
        formatter: LineFormatter,
        sink: LineSink,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            feed,
            opts,
            formatter: Arc::new(formatter),
            sink,
            diagnostics,
            drain_timeout: None,
        }
    }

    /// Bound the wait for readers after cancellation. Readers still running
    /// when it expires are aborted and detached; `run` returns without waiting
    /// for them.
    pub fn with_drain_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Run until `shutdown` resolves or every reader finishes, then drain.
    ///
    /// Returns the process exit code: `1` for usage or resolution failures,
    /// `0` otherwise. Per-source stream failures never change the exit code.
    pub async fn run<S>(&self, source_ids: &[String], shutdown: S) -> i32
    where
        S: Future<Output = ()>,
    {
        enter(Phase::Init);
        if source_ids.is_empty() {
            let err = dtail_core::DtailError::Usage;
            self.diagnostics.fatal(&err);
            enter(Phase::Done);
            return err.exit_code();
        }
        if let Some(err) = sanitize::pattern_error() {
            self.diagnostics.sanitizer_unavailable(err);
        }

        enter(Phase::Resolving);
        let resolved = assign_labels(source_ids, |id| {
            let feed = Arc::clone(&self.feed);
            async move { feed.inspect(&id).await }
        })
        .await;
        let sources = match resolved {
            Ok(sources) => sources,
            Err(err) => {
                self.diagnostics.fatal(&err);
                enter(Phase::Done);
                return err.exit_code();
            }
        };

        enter(Phase::Streaming);
        let cancel = CancellationToken::new();
        let mut readers = JoinSet::new();
        for source in sources {
            let reader = StreamReader::new(
                source,
                self.opts,
                Arc::clone(&self.formatter),
                self.sink.clone(),
                self.diagnostics.clone(),
                cancel.clone(),
            );
            let feed = Arc::clone(&self.feed);
            readers.spawn(async move { reader.run(feed.as_ref()).await });
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(active = readers.len(), "termination requested");
                    break;
                }
                joined = readers.join_next() => match joined {
                    Some(result) => log_join(result),
                    None => {
                        tracing::info!("all readers finished");
                        break;
                    }
                },
            }
        }

        enter(Phase::Draining);
        cancel.cancel();
        self.drain(&mut readers).await;

        enter(Phase::Done);
        EXIT_OK
    }

    async fn drain(&self, readers: &mut JoinSet<ReaderExit>) {
        let join_all = async {
            while let Some(result) = readers.join_next().await {
                log_join(result);
            }
        };

        match self.drain_timeout {
            None => join_all.await,
            Some(limit) => {
                if tokio::time::timeout(limit, join_all).await.is_err() {
                    tracing::warn!(
                        remaining = readers.len(),
                        timeout_ms = limit.as_millis() as u64,
                        "readers did not stop in time; aborting"
                    );
                    // Readers parked in a blocking sink write never see the
                    // abort; they are detached, not awaited.
                    readers.abort_all();
                    readers.detach_all();
                }
            }
        }
    }
}

fn enter(phase: Phase) {
    tracing::debug!(%phase, "coordinator phase");
}

fn log_join(result: Result<ReaderExit, JoinError>) {
    match result {
        Ok(exit) => tracing::debug!(?exit, "reader joined"),
        Err(e) if e.is_panic() => tracing::error!(error = %e, "reader panicked"),
        Err(e) => tracing::debug!(error = %e, "reader aborted"),
    }
}
