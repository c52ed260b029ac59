//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Unknown action kind: {0}")]
    UnknownActionKind(String),
}

impl DomainError {
    /// Check if this error is a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }

    /// Check if this error came from undecodable collaborator output
    pub fn is_malformed_output(&self) -> bool {
        matches!(self, DomainError::MalformedOutput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_error_display() {
        let error = DomainError::InvalidTransition {
            entity: "dispute",
            from: "resolved".to_string(),
            to: "unresolved".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid dispute transition: resolved -> unresolved"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(DomainError::NotFound("agent_x".to_string()).is_not_found());
        assert!(!DomainError::InvalidArgument("to".to_string()).is_not_found());
        assert!(DomainError::MalformedOutput("no json".to_string()).is_malformed_output());
    }
}
