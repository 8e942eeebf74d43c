//! Rotation error definitions.

use thiserror::Error;

use crate::rotation::bucket::MAX_INTERVAL_MINUTES;

/// Errors raised by the rotation core.
///
/// Every variant is a configuration or input error. They are reported to the
/// caller immediately and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    /// Interval is zero, negative or larger than the supported maximum.
    #[error(
        "Invalid rotation interval: {0} minutes (must be between 1 and {max})",
        max = MAX_INTERVAL_MINUTES
    )]
    InvalidInterval(i64),

    /// Operator identity is empty or malformed.
    #[error("Invalid operator identity: {0}")]
    InvalidIdentity(String),

    /// Bucket string is not in canonical `YYYY-MM-DDTHH:MM` form.
    #[error("Invalid time bucket '{0}'")]
    InvalidBucket(String),

    /// Text is not a 20-byte hex address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl RotationError {
    /// True for errors that mean the service cannot be constructed at all.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidInterval(_) | Self::InvalidIdentity(_))
    }
}

/// Result type for rotation operations.
pub type RotationResult<T> = Result<T, RotationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RotationError::InvalidInterval(0);
        assert_eq!(
            err.to_string(),
            "Invalid rotation interval: 0 minutes (must be between 1 and 527040)"
        );

        let err = RotationError::InvalidBucket("yesterday".to_string());
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_configuration_class() {
        assert!(RotationError::InvalidInterval(-5).is_configuration());
        assert!(RotationError::InvalidIdentity("".into()).is_configuration());
        assert!(!RotationError::InvalidBucket("x".into()).is_configuration());
    }
}
