//! dtail-feeds: container log feed adapters for dtail.
//!
//! A feed exposes the two engine capabilities the reader pipeline needs:
//! container metadata lookup and opening a (possibly endless) log byte stream.
//! [`docker::DockerClient`] implements them against the Docker Engine API.

use std::future::Future;
use std::pin::Pin;

use dtail_core::{Source, StreamOptions};
use tokio::io::AsyncBufRead;

pub mod docker;
pub mod error;
pub mod frame;

pub use docker::{DockerClient, Endpoint};
pub use dtail_core::Metadata;
pub use error::FeedError;

/// An open log stream. Dropping it closes the underlying connection, which
/// also ends any read in progress.
pub type LogStream = Pin<Box<dyn AsyncBufRead + Send>>;

/// A source of container logs.
pub trait LogFeed: Send + Sync + 'static {
    /// Look up metadata for `container_id`.
    fn inspect(&self, container_id: &str) -> impl Future<Output = Result<Metadata, FeedError>> + Send;

    /// Open the log stream for a resolved `source` with the run-wide options.
    fn open_log_stream(
        &self,
        source: &Source,
        opts: &StreamOptions,
    ) -> impl Future<Output = Result<LogStream, FeedError>> + Send;
}
