//! Error types for codegraph-pta
//!
//! Provides unified error handling across the crate.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for pointer analysis operations
#[derive(Debug, Error)]
pub enum PtaError {
    /// Configuration error (raised before any solver run)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Entry point that the class hierarchy cannot resolve
    #[error("Unknown entry point: {0}")]
    UnknownEntryPoint(String),

    /// Malformed method signature
    #[error("Invalid method signature: {0}")]
    InvalidSignature(String),

    /// Internal invariant violation (always fatal)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Run aborted before quiescence; results are discarded
    #[error("Incomplete run: {0}")]
    Incomplete(String),

    /// Query issued before the solver reached quiescence
    #[error("Solver has not reached quiescence: {0}")]
    NotSolved(String),

    /// Program input error (JSON program loading)
    #[error("Program error: {0}")]
    Program(String),
}

impl PtaError {
    /// Create an invariant violation
    pub fn invariant(msg: impl Into<String>) -> Self {
        PtaError::InvariantViolation(msg.into())
    }

    /// Create an incomplete-run error
    pub fn incomplete(msg: impl Into<String>) -> Self {
        PtaError::Incomplete(msg.into())
    }

    /// Create a program input error
    pub fn program(msg: impl Into<String>) -> Self {
        PtaError::Program(msg.into())
    }

    /// Whether the error came from a cancelled or timed-out run
    pub fn is_incomplete(&self) -> bool {
        matches!(self, PtaError::Incomplete(_))
    }
}

impl From<serde_json::Error> for PtaError {
    fn from(err: serde_json::Error) -> Self {
        PtaError::Program(err.to_string())
    }
}

/// Result type alias for pointer analysis operations
pub type PtaResult<T> = std::result::Result<T, PtaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: PtaError = ConfigError::MissingVersion.into();
        assert!(matches!(err, PtaError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_incomplete_predicate() {
        assert!(PtaError::incomplete("cancelled").is_incomplete());
        assert!(!PtaError::invariant("shrink").is_incomplete());
    }
}
