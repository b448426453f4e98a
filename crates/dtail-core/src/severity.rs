//! Severity markers.

use crate::types::Severity;

/// Classify a sanitized line by case-sensitive marker substring.
///
/// `ERROR` wins over `WARN` when both appear.
pub fn classify(line: &str) -> Severity {
    if line.contains("ERROR") {
        Severity::Error
    } else if line.contains("WARN") {
        Severity::Warn
    } else {
        Severity::Info
    }
}
