//! Errors for model-predicted tracks (construction, indexing, and
//! configuration).
//!
//! [`TrackError`] covers the track constructor's table validation, vertex
//! and label indexing, weight handling, and the thread-count policy. Label
//! validation failures raised by the shared [`crate::data::labels`] routines
//! are carried through the [`TrackError::Label`] bridge.
use crate::data::DataError;

/// Result alias for track operations that may produce [`TrackError`].
pub type TrackResult<T> = Result<T, TrackError>;

/// Unified error type for track construction and configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    /// A `weights` column and a separate `weights` argument were both
    /// supplied.
    DuplicateWeights,

    /// A prediction column's length disagrees with the rest of the mapping.
    LengthMismatch { label: String, expected: usize, actual: usize },

    /// The weights sequence does not have one entry per vertex.
    WeightCount { expected: usize, actual: usize },

    /// A weight is negative or non-finite.
    InvalidWeight { index: usize, value: f64 },

    /// The mapping describes no usable track.
    EmptyTrack { reason: &'static str },

    /// A vertex index beyond the track's length.
    VertexOutOfRange { index: usize, len: usize },

    /// A thread count of zero was requested.
    InvalidThreadCount { value: usize },

    /// More than one thread was requested but the crate was built without
    /// the `parallel` feature.
    NoConcurrency { requested: usize },

    /// A label validation or lookup failure.
    Label(DataError),
}

impl std::error::Error for TrackError {}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackError::DuplicateWeights => {
                write!(
                    f,
                    "Weights supplied twice: both a \"weights\" column and a weights argument."
                )
            }
            TrackError::LengthMismatch { label, expected, actual } => {
                write!(
                    f,
                    "Column {label:?} has length {actual}; expected {expected} to match the \
                     rest of the mapping"
                )
            }
            TrackError::WeightCount { expected, actual } => {
                write!(f, "Expected one weight per vertex ({expected}); got {actual}")
            }
            TrackError::InvalidWeight { index, value } => {
                write!(f, "Weight at vertex {index} must be finite and nonnegative; got {value}")
            }
            TrackError::EmptyTrack { reason } => {
                write!(f, "Track construction failed: {reason}")
            }
            TrackError::VertexOutOfRange { index, len } => {
                write!(f, "Vertex index {index} out of range for track of length {len}")
            }
            TrackError::InvalidThreadCount { value } => {
                write!(f, "Thread count must be a positive integer; got {value}")
            }
            TrackError::NoConcurrency { requested } => {
                write!(
                    f,
                    "{requested} threads requested, but this build has no multi-threading \
                     support (enable the \"parallel\" feature)"
                )
            }
            TrackError::Label(err) => err.fmt(f),
        }
    }
}

impl From<DataError> for TrackError {
    fn from(err: DataError) -> TrackError {
        TrackError::Label(err)
    }
}
