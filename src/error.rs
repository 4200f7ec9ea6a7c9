//! Error types for lab runs, sweeps and artifact bundling.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type LabResult<T> = Result<T, LabError>;

/// Errors raised at the configuration boundary, before any integration step.
///
/// Numerical degeneracies inside a run are guarded locally and never surface
/// here; unknown selector names fall back to documented defaults instead of
/// erroring.
#[derive(Debug, Error)]
pub enum LabError {
    /// A numeric parameter is outside its admissible range.
    #[error("Invalid config: {field} {reason}")]
    InvalidConfig {
        /// Name of the offending configuration key
        field: &'static str,
        /// What is wrong with the value
        reason: String,
    },

    /// A perturbation event targets a node that does not exist.
    #[error("Perturbation target {index} out of range for {n_oscillators} oscillators")]
    TargetOutOfRange {
        index: usize,
        n_oscillators: usize,
    },

    /// A sweep was cancelled between two independent runs.
    #[error("Sweep cancelled")]
    Cancelled,

    /// Config parsing or artifact serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LabError {
    /// Create an InvalidConfig error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        let err = LabError::invalid("dt", "must be positive, got -0.1");
        assert_eq!(err.to_string(), "Invalid config: dt must be positive, got -0.1");

        let err = LabError::TargetOutOfRange {
            index: 40,
            n_oscillators: 32,
        };
        assert!(err.to_string().contains("40"));
        assert!(err.to_string().contains("32"));
    }

    #[test]
    fn serde_errors_convert() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: LabError = parse.unwrap_err().into();
        assert!(matches!(err, LabError::Serialization(_)));
    }
}
