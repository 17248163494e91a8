//! Errors for likelihood evaluation.
//!
//! Only conditions the caller can act on surface here: a track that lacks a
//! quantity some datum measures, a degenerate covariance discovered at
//! normalization time, and a worker-pool construction failure. Matrix-kernel
//! failures *during* evaluation indicate an internal inconsistency and abort
//! with a diagnostic instead of returning.

/// Result alias for likelihood evaluations that may produce
/// [`LikelihoodError`].
pub type LikelihoodResult<T> = Result<T, LikelihoodError>;

/// Unified error type for likelihood evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum LikelihoodError {
    /// The track does not predict a quantity the datum measures.
    ProjectionIncomplete { label: String },

    /// The datum's covariance has a non-positive determinant, so the
    /// Gaussian normalization is undefined.
    Singular { determinant: f64 },

    /// The worker thread pool could not be constructed.
    ThreadPool { reason: String },
}

impl std::error::Error for LikelihoodError {}

impl std::fmt::Display for LikelihoodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LikelihoodError::ProjectionIncomplete { label } => {
                write!(
                    f,
                    "Track does not predict quantity {label:?}, which the datum measures."
                )
            }
            LikelihoodError::Singular { determinant } => {
                write!(
                    f,
                    "Covariance matrix is degenerate (determinant {determinant}); the \
                     Gaussian normalization is undefined."
                )
            }
            LikelihoodError::ThreadPool { reason } => {
                write!(f, "Worker thread pool construction failed: {reason}")
            }
        }
    }
}
