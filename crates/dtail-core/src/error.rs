//! Errors that abort a run before any stream is opened.

use thiserror::Error;

/// Process-level failures. Per-stream faults never reach this type; they are
/// reported on the diagnostics sink and only shrink the set of live sources.
#[derive(Debug, Error)]
pub enum DtailError {
    /// No container identifiers were supplied.
    #[error("please provide at least one container ID")]
    Usage,

    /// Metadata lookup failed for a container during startup.
    #[error("error inspecting container {source_id}: {message}")]
    Resolution { source_id: String, message: String },
}

impl DtailError {
    /// Exit code the binary reports for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
