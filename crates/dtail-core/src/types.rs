//! Core types for dtail-core.
//!
//! This module defines the data shared across the pipeline: the resolved
//! [`Source`] a reader tails, the engine [`Metadata`] it is resolved from, the
//! run-wide [`StreamOptions`], and the per-line [`Severity`] tag.

use std::fmt;

/// One container being tailed.
///
/// Built once during label resolution and never mutated afterwards; readers
/// receive it by value (it is cheap to clone) so no lookups happen while
/// streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Container identifier exactly as supplied on the command line.
    pub id: String,
    /// Human-readable name reported by the engine, leading `/` stripped.
    pub display_name: String,
    /// Index into the label palette: `position % palette size`.
    pub color_index: usize,
    /// Whether the container runs with a TTY, in which case its log stream
    /// carries raw bytes instead of multiplexed frames.
    pub tty: bool,
}

/// Container metadata reported by the engine during label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Name as reported by the engine (Docker prefixes it with `/`).
    pub name: String,
    /// Whether the container runs with a TTY (unframed log stream).
    pub tty: bool,
}

/// Options applied identically to every stream in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOptions {
    /// Keep the stream open and emit new lines as they are produced.
    pub follow: bool,
    /// When greater than zero, request only the last `tail` lines of history.
    pub tail: usize,
}

/// Severity tag derived from a sanitized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warn,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warn => write!(f, "WARN"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}
