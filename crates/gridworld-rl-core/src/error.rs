//! Error types for the RL core library

use thiserror::Error;

/// Core error type for environment and registry operations
#[derive(Error, Debug)]
pub enum RLError {
    /// Environment-related errors
    #[error("Environment error: {0}")]
    Environment(String),

    /// Invalid action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Invalid state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Size that was supplied
        actual: usize,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// `step` or `render` called before the first `reset`
    #[error("Cannot call `{0}` before `reset`")]
    ResetNeeded(&'static str),

    /// Malformed environment id
    #[error("Malformed environment ID: `{0}` (expected `[namespace/]name[-v(version)]`)")]
    InvalidEnvId(String),

    /// Environment id already registered under a strict conflict policy
    #[error("Environment `{0}` is already registered")]
    DuplicateEnvId(String),

    /// Versioned and unversioned ids of the same environment cannot coexist
    #[error("Cannot register `{new}`: conflicts with registered `{existing}`")]
    VersionConflict {
        /// Id being registered
        new: String,
        /// Already-registered id it collides with
        existing: String,
    },

    /// No environment in the requested namespace
    #[error("Namespace `{0}` not found")]
    NamespaceNotFound(String),

    /// No environment with the requested name
    #[error("Environment `{name}` doesn't exist.{}", suggestion_text(.suggestion))]
    NameNotFound {
        /// Requested name (with namespace, if any)
        name: String,
        /// Closest registered name, if one is close enough
        suggestion: Option<String>,
    },

    /// Requested version of an existing environment is missing
    #[error("Environment version `v{version}` for `{name}` not found. Available versions: {available}")]
    VersionNotFound {
        /// Requested name (with namespace, if any)
        name: String,
        /// Requested version
        version: u32,
        /// Registered versions, formatted
        available: String,
    },

    /// Requested version has been superseded by a newer one
    #[error("Environment version `v{version}` for `{name}` is deprecated. Please use `{latest}` instead.")]
    DeprecatedEnv {
        /// Requested name (with namespace, if any)
        name: String,
        /// Requested version
        version: u32,
        /// Id of the latest registered version
        latest: String,
    },

    /// Entry point could not be resolved at construction time
    #[error("Entry point `{0}` could not be resolved")]
    EntryPointNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

fn suggestion_text(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" Did you mean: `{s}`?"))
        .unwrap_or_default()
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_not_found_message_includes_suggestion() {
        let err = RLError::NameNotFound {
            name: "src/GridWrld".to_string(),
            suggestion: Some("src/GridWorld".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Environment `src/GridWrld` doesn't exist. Did you mean: `src/GridWorld`?"
        );

        let err = RLError::NameNotFound {
            name: "Pong".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "Environment `Pong` doesn't exist.");
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: RLError = parse.unwrap_err().into();
        assert!(matches!(err, RLError::Serialization(_)));
    }
}
