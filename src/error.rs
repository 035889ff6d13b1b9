//! Error types for the fingerprinting pipeline

use std::fmt;

/// Errors that can occur while generating or decoding a fingerprint
///
/// Every variant is terminal for the current invocation. The pipeline is a
/// pure computation, so retrying with the same input cannot succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum FingerprintError {
    /// Non-positive or undersized sample count, or invalid parameters
    InvalidInput(String),

    /// The sample buffer contains NaN or infinite values
    CorruptSamples(String),

    /// A bound check inside the pipeline failed (indicates a bug)
    InternalInvariantViolation(String),

    /// A fingerprint string could not be decoded
    MalformedCode(String),

    /// Cancellation was requested between two frames
    Cancelled,
}

impl fmt::Display for FingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            FingerprintError::CorruptSamples(msg) => write!(f, "Corrupt samples: {}", msg),
            FingerprintError::InternalInvariantViolation(msg) => {
                write!(f, "Internal invariant violation: {}", msg)
            }
            FingerprintError::MalformedCode(msg) => write!(f, "Malformed fingerprint code: {}", msg),
            FingerprintError::Cancelled => write!(f, "Fingerprint generation cancelled"),
        }
    }
}

impl std::error::Error for FingerprintError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let err = FingerprintError::InvalidInput("sample count is 0".to_string());
        assert_eq!(err.to_string(), "Invalid input: sample count is 0");

        let err = FingerprintError::CorruptSamples("NaN at index 3".to_string());
        assert!(err.to_string().contains("index 3"));
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(
            FingerprintError::Cancelled.to_string(),
            "Fingerprint generation cancelled"
        );
    }
}
