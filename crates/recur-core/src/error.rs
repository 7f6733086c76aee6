//! Error types for recur-core.
//!
//! Only the text-facing layers (rule parsing, value parsing, zone lookup)
//! can fail. Iteration itself never returns an error: rules that cannot
//! produce occurrences resolve to an exhausted iterator.

use thiserror::Error;

/// The main error type for recur operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurError {
    /// Invalid timezone name or offset provided.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Error parsing a date, date-time, token or integer.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Structurally incomplete recurrence rule.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

/// Result type alias for recur operations.
pub type Result<T> = std::result::Result<T, RecurError>;
