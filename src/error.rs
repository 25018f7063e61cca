//! Error types for the chartcal library

use thiserror::Error;

/// Result type alias for chartcal operations
pub type Result<T> = std::result::Result<T, CorrectionError>;

/// Error types for chart detection, model training, and correction
///
/// Expected, recoverable conditions (no chart in the image, too few
/// patches) are reported through [`DetectionResult`](crate::DetectionResult)
/// and [`CalibrationReport`](crate::CalibrationReport) rather than through
/// this enum. These variants cover programmer misuse and genuine
/// processing failures, which fail fast instead of producing silently
/// wrong output.
#[derive(Error, Debug)]
pub enum CorrectionError {
    /// Chart could not be located or sampled
    #[error("chart detection failed: {reason}")]
    DetectionFailure { reason: String },

    /// `apply()` called on a model that was never trained
    #[error("correction model is not trained; call train() first")]
    ModelNotTrained,

    /// `correct()` called on a pipeline that was never calibrated
    #[error("pipeline is not calibrated; call calibrate() first")]
    NotCalibrated,

    /// Reference and captured color sequences have different lengths
    #[error("training data mismatch: {reference} reference colors vs {captured} captured colors")]
    TrainingDataMismatch { reference: usize, captured: usize },

    /// Two images that must share a dimension do not
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Malformed or degenerate input buffer
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Numerical failure in model fitting
    #[error("numerical failure: {message}")]
    Numerical { message: String },
}

impl CorrectionError {
    /// Create a detection failure with context
    pub fn detection(reason: impl Into<String>) -> Self {
        Self::DetectionFailure {
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error from two (width, height) pairs
    pub fn dimensions(expected: (u32, u32), actual: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a numerical failure error
    pub fn numerical(message: impl Into<String>) -> Self {
        Self::Numerical {
            message: message.into(),
        }
    }

    /// Check if this error indicates API misuse rather than bad data
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            CorrectionError::ModelNotTrained
                | CorrectionError::NotCalibrated
                | CorrectionError::TrainingDataMismatch { .. }
        )
    }
}
