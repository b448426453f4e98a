//! Display-line composition.
//!
//! [`LineFormatter`] turns one raw line from a container into the text written
//! to the output sink: `"<timestamp> [<label>] <body>"`. The formatter holds
//! no per-source state, so a single instance is shared by every reader.

use chrono::{DateTime, Local};

use crate::palette::{Painter, Style};
use crate::sanitize::sanitize;
use crate::severity::classify;
use crate::types::{Severity, Source};

/// One rendered output line, without a trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedLine {
    pub severity: Severity,
    pub text: String,
}

/// Sanitizes, classifies and renders raw lines.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    painter: Painter,
    timestamp_format: String,
}

impl LineFormatter {
    pub fn new(painter: Painter, timestamp_format: impl Into<String>) -> Self {
        Self {
            painter,
            timestamp_format: timestamp_format.into(),
        }
    }

    /// Render `raw` for `source`, stamped with the current local time.
    pub fn format(&self, source: &Source, raw: &str) -> FormattedLine {
        self.format_at(source, raw, Local::now())
    }

    /// Render `raw` for `source` with an explicit timestamp.
    pub fn format_at(&self, source: &Source, raw: &str, at: DateTime<Local>) -> FormattedLine {
        let clean = sanitize(raw);
        let severity = classify(&clean);
        let label = self
            .painter
            .colorize(&source.display_name, Style::Palette(source.color_index));
        let body = self.painter.colorize(&clean, severity.into());
        FormattedLine {
            severity,
            text: format!("{} [{}] {}", at.format(&self.timestamp_format), label, body),
        }
    }
}
