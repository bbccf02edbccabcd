//! Error types for parsing and validating observation data.

use thiserror::Error;

/// Errors that can occur when parsing or validating observation data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Text could not be parsed as a timestamp.
    #[error("Invalid timestamp '{0}': expected RFC 3339 or YYYY-MM-DDTHH:MM:SS")]
    InvalidTimestamp(String),

    /// Text could not be parsed as a calendar date.
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A field of an observation draft holds an unusable value.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        /// JSON name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type alias using weather-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
