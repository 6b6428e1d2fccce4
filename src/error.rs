//! Error types for planning operations.

use thiserror::Error;

/// Errors that can occur while analyzing rooms or generating layouts.
///
/// "Nothing fits" outcomes are never errors; they are reported as data
/// (warnings, `resolved = false`, `max_objects = 0`).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlannerError {
    /// Malformed or degenerate input, e.g. a floor polygon with fewer than 3 vertices.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced room or object does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What was looked up ("room", "object").
        kind: &'static str,
        /// The id that failed to resolve.
        id: String,
    },

    /// The requested layout template is not known.
    #[error("Unknown layout template '{0}'")]
    UnknownTemplate(String),
}

impl PlannerError {
    /// Short machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::InvalidInput(_) => "invalid_input",
            PlannerError::NotFound { .. } => "not_found",
            PlannerError::UnknownTemplate(_) => "unknown_template",
        }
    }
}

/// Result type for planning operations.
pub type PlannerResult<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::InvalidInput("floor polygon needs at least 3 vertices".into());
        assert!(format!("{err}").contains("at least 3 vertices"));

        let err = PlannerError::NotFound {
            kind: "room",
            id: "r-7".into(),
        };
        assert_eq!(format!("{err}"), "room 'r-7' not found");
        assert_eq!(err.code(), "not_found");

        let err = PlannerError::UnknownTemplate("ballroom".into());
        assert!(format!("{err}").contains("ballroom"));
    }
}
