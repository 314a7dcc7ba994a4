//! Shared types and errors for the argcast argument pipelines.
//!
//! This crate provides the foundational types used by the other argcast crates:
//! - `Value`: dynamically-typed argument values, including the `Null` and `Missing` sentinels
//! - `Message` / `MessageData`: diagnostic catalogue and lazily formatted templates
//! - `CastError`: unified error taxonomy

pub mod message;
pub mod value;

pub use message::{ArgFormatter, Message, MessageArg, MessageData};
pub use value::{
    double_na, is_double_na, Complex, ElementKind, Logical, Value, ValueKind, Vector, VectorData,
    INT_NA,
};

/// Unified error type for casting arguments.
#[derive(Debug, thiserror::Error)]
pub enum CastError {
    // === Cast Errors ===
    /// A pipeline aborted with a user-facing diagnostic.
    #[error("{message}")]
    Validation { argument: String, message: String },

    #[error("Custom step '{step}' failed on argument '{argument}': {message}")]
    Custom {
        argument: String,
        step: String,
        message: String,
    },

    // === Generic ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl CastError {
    pub fn validation(argument: impl Into<String>, message: impl Into<String>) -> Self {
        CastError::Validation {
            argument: argument.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the error is a user-facing validation diagnostic.
    pub fn is_validation(&self) -> bool {
        matches!(self, CastError::Validation { .. })
    }

    /// The argument the error was raised for, if any.
    pub fn argument(&self) -> Option<&str> {
        match self {
            CastError::Validation { argument, .. } | CastError::Custom { argument, .. } => {
                Some(argument)
            }
            _ => None,
        }
    }
}

/// Convenience alias used throughout argcast.
pub type Result<T> = std::result::Result<T, CastError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_message_only() {
        let err = CastError::validation("x", "invalid 'x' argument");
        assert_eq!(err.to_string(), "invalid 'x' argument");
        assert!(err.is_validation());
        assert_eq!(err.argument(), Some("x"));
    }

    #[test]
    fn custom_error_names_step() {
        let err = CastError::Custom {
            argument: "n".into(),
            step: "clamp".into(),
            message: "overflow".into(),
        };
        assert_eq!(
            err.to_string(),
            "Custom step 'clamp' failed on argument 'n': overflow"
        );
        assert!(!err.is_validation());
        assert_eq!(err.argument(), Some("n"));
    }

    #[test]
    fn json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: CastError = parse.unwrap_err().into();
        assert!(matches!(err, CastError::Json(_)));
        assert_eq!(err.argument(), None);
    }
}
