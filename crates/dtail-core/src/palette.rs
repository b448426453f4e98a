//! Colour rendering for labels and severities.
//!
//! Thin wrapper over [`crossterm::style`]. A [`Painter`] is resolved once at
//! startup from the configured [`ColorMode`] and shared read-only by every
//! reader, so colouring never touches global state.

use std::io::IsTerminal;
use std::str::FromStr;

use crossterm::style::{Color, ContentStyle, Stylize};
use serde::Deserialize;

use crate::types::Severity;

/// Container label colours, assigned by position and cycled.
pub const LABEL_PALETTE: [Color; 6] = [
    Color::DarkGreen,
    Color::DarkYellow,
    Color::DarkBlue,
    Color::DarkMagenta,
    Color::DarkCyan,
    Color::DarkRed,
];

/// Number of distinct label colours.
pub const PALETTE_SIZE: usize = LABEL_PALETTE.len();

/// Named style understood by [`Painter::colorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Label colour at the given palette index (wrapped modulo the palette).
    Palette(usize),
    Error,
    Warn,
    Info,
}

impl From<Severity> for Style {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Style::Error,
            Severity::Warn => Style::Warn,
            Severity::Info => Style::Info,
        }
    }
}

/// When escape sequences are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colour only when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            other => Err(format!("unknown colour mode {other:?} (expected auto, always or never)")),
        }
    }
}

/// Applies [`Style`]s to text, or passes text through when colour is off.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    /// Resolve `mode` against the current process environment.
    pub fn new(mode: ColorMode) -> Self {
        let enabled = match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
            }
        };
        Self { enabled }
    }

    /// A painter that never emits escape sequences.
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Render `text` in `style`.
    pub fn colorize(&self, text: &str, style: Style) -> String {
        if !self.enabled {
            return text.to_owned();
        }
        match content_style(style) {
            Some(cs) => cs.apply(text).to_string(),
            None => text.to_owned(),
        }
    }
}

fn content_style(style: Style) -> Option<ContentStyle> {
    match style {
        Style::Palette(i) => Some(ContentStyle::new().with(LABEL_PALETTE[i % PALETTE_SIZE])),
        Style::Error => Some(ContentStyle::new().with(Color::DarkRed).bold()),
        Style::Warn => Some(ContentStyle::new().with(Color::DarkYellow).bold()),
        Style::Info => None,
    }
}
