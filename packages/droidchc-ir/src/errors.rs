//! Error types for droidchc-ir
//!
//! Provides unified error handling across the crate.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for droidchc-ir operations
#[derive(Debug, Error)]
pub enum DroidChcError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Program model (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed program model (bad class, method, or instruction)
    #[error("Model error: {0}")]
    Model(String),

    /// Malformed switch or array payload
    #[error("Payload error: {0}")]
    Payload(String),

    /// Allocation at a site the local-heap layout does not know.
    ///
    /// The previous epoch of such a site cannot be lifted, so compilation of the
    /// whole program is aborted.
    #[error("Inconsistent allocation at site {site} ({class}->{method} @pc {pc})")]
    InconsistentAllocation {
        site: i32,
        class: String,
        method: String,
        pc: u32,
    },

    /// Clause construction or export error
    #[error("Compile error: {0}")]
    Compile(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DroidChcError {
    /// Create a model error
    pub fn model(msg: impl Into<String>) -> Self {
        DroidChcError::Model(msg.into())
    }

    /// Create a payload error
    pub fn payload(msg: impl Into<String>) -> Self {
        DroidChcError::Payload(msg.into())
    }

    /// Create a compile error
    pub fn compile(msg: impl Into<String>) -> Self {
        DroidChcError::Compile(msg.into())
    }

    /// Whether the error must abort the whole run rather than skip one method
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DroidChcError::InconsistentAllocation { .. } | DroidChcError::Io(_)
        )
    }
}

/// Result type alias for droidchc operations
pub type Result<T> = std::result::Result<T, DroidChcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let err = DroidChcError::InconsistentAllocation {
            site: 42,
            class: "LFoo;".to_string(),
            method: "bar()V".to_string(),
            pc: 3,
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("LFoo;->bar()V @pc 3"));

        assert!(!DroidChcError::model("bad method").is_fatal());
        assert!(!DroidChcError::payload("missing payload").is_fatal());
    }
}
