use thiserror::Error;

/// The error type for `unet-burn` operations.
///
/// Construction errors are raised before any module is built; forward errors
/// are raised before any stage runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UnetError {
    /// Error for when an invalid network configuration is provided.
    /// This covers inconsistent channel schedules and operator settings that
    /// cannot be applied to the requested channel widths.
    #[error("Invalid model configuration: {reason}")]
    InvalidConfiguration {
        /// The reason why the configuration is invalid.
        reason: String,
    },

    /// Error for when an input tensor has an invalid shape.
    #[error("Invalid input tensor shape: expected {expected}, got {actual}")]
    InvalidTensorShape {
        /// The expected tensor shape.
        expected: String,
        /// The actual tensor shape.
        actual: String,
    },
}

/// A specialized `Result` type for `unet-burn` operations.
pub type UnetResult<T> = Result<T, UnetError>;
