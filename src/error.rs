//! Error types for the animation engine

use serde::{Deserialize, Serialize};

/// Error type for engine operations.
///
/// User data errors (bad property specs, unresolvable selectors) never
/// surface here; they are logged and the offending entity is skipped. The
/// engine only fails hard when its cooperative scheduler cannot make
/// progress or when configuration is unusable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimError {
    /// The structural-mutation counter kept changing for too many drain
    /// iterations, which means an instruction keeps scheduling work forever.
    #[error("Max async loop reached ({iterations} iterations)")]
    MaxAsyncLoop { iterations: u32 },

    /// Invalid engine configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Invalid animation parameters
    #[error("Invalid parameters: {reason}")]
    InvalidParams { reason: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

impl AnimError {
    /// Create a new parameter error
    pub fn params(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidParams { .. } | Self::Serialization { .. }
        )
    }
}

impl From<serde_json::Error> for AnimError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(AnimError::params("bad").is_recoverable());
        assert!(!AnimError::MaxAsyncLoop { iterations: 100 }.is_recoverable());
    }

    #[test]
    fn test_display() {
        let err = AnimError::MaxAsyncLoop { iterations: 100 };
        assert_eq!(err.to_string(), "Max async loop reached (100 iterations)");
    }

    #[test]
    fn test_serialization_roundtrip() {
        let err = AnimError::params("missing target");
        let json = serde_json::to_string(&err).unwrap();
        let back: AnimError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }
}
