//! Error types returned by the detection pipeline.
//!
//! Errors are propagated to the caller, never logged from inside the core.
//! Per-pixel degeneracies are not errors: a ray whose unprojection yields a
//! non-finite position or direction is silently dropped, and empty motion,
//! empty ray sets and empty detection lists are all success outcomes.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure modes of the detection pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Mismatched image dimensions or stride, or a channel count outside
    /// {1, 3, 4}.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-invertible view-projection, non-finite camera attributes, or a
    /// non-positive field of view.
    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    /// Detector parameters outside their domain (minimum voxel side,
    /// camera quorum, subdivision factor, footprint ratio, target zone).
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A non-finite value escaped an intermediate computation.
    #[error("numeric overflow: {0}")]
    NumericOverflow(String),
}
