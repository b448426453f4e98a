//! dtail: tail several containers at once.
//!
//! Each requested container gets its own reader task; every reader writes
//! complete, timestamped, colour-labelled lines to one shared output stream.
//!
//! # Architecture
//!
//! ```text
//!                ┌─► StreamReader(a) ─┐
//! Coordinator ───┼─► StreamReader(b) ─┼──► LineSink (stdout)
//!    │           └─► StreamReader(c) ─┘         Diagnostics (stderr)
//!    └── shutdown signal ──► CancellationToken ──► all readers
//! ```
//!
//! The engine client lives in `dtail-feeds`; line sanitizing, severity
//! markers, labels and rendering live in `dtail-core`.

pub mod coordinator;
pub mod reader;
pub mod sink;

pub use coordinator::{Coordinator, Phase};
pub use reader::{ReaderExit, StreamReader};
pub use sink::{Diagnostics, LineSink};
