//! Control-character stripping.
//!
//! Every raw line passes through [`sanitize`] before classification, so
//! carriage returns, terminal escape bytes and stray engine framing never
//! reach the output.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

const CONTROL_CHARS: &str = r"[\x00-\x1F\x7F]";

static CONTROL_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn control_re() -> Result<&'static Regex, &'static regex::Error> {
    CONTROL_RE.get_or_init(|| Regex::new(CONTROL_CHARS)).as_ref()
}

/// The error that keeps the control-character pattern from compiling, if any.
/// The coordinator checks this once at startup and reports it on diagnostics.
pub fn pattern_error() -> Option<&'static regex::Error> {
    control_re().err()
}

/// Remove every character in `0x00..=0x1F` and `0x7F` from `raw`.
///
/// Never fails. If the pattern cannot be built the line is returned untouched
/// and a warning is logged.
pub fn sanitize(raw: &str) -> Cow<'_, str> {
    match control_re() {
        Ok(re) => re.replace_all(raw, ""),
        Err(e) => {
            tracing::warn!(error = %e, "control-character pattern unavailable; passing line through");
            Cow::Borrowed(raw)
        }
    }
}
