//! dtail-core: shared pieces of the dtail line pipeline.
//!
//! # Pipeline
//!
//! ```text
//! raw line ──► sanitize ──► classify ──► LineFormatter ──► sink
//!                                            ▲
//!                    assign_labels ──► Source┘
//! ```
//!
//! Everything here is synchronous and free of I/O except label resolution,
//! which is generic over the lookup so it can be driven by any engine client.

pub mod config;
pub mod error;
pub mod format;
pub mod label;
pub mod palette;
pub mod sanitize;
pub mod severity;
pub mod types;

pub use error::DtailError;
pub use format::{FormattedLine, LineFormatter};
pub use palette::{ColorMode, Painter, Style};
pub use types::{Metadata, Severity, Source, StreamOptions};
