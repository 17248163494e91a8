//! Errors for the data model (labels, covariance matrices, data vectors, and
//! samples).
//!
//! This module defines [`DataError`], shared by everything under
//! [`crate::data`]. Errors arise at the edges — construction, assignment,
//! lookup — and propagate to the caller unchanged. Matrix-kernel failures
//! encountered while maintaining a covariance inverse are wrapped via
//! `From<MatrixError>` so callers see a single error type per domain.
//!
//! ## Conventions
//! - Indices are 0-based.
//! - Labels are reported verbatim in messages.
use crate::linalg::MatrixError;

/// Result alias for data-model operations that may produce [`DataError`].
pub type DataResult<T> = Result<T, DataError>;

/// Unified error type for the data model.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Label validation ----
    /// A label contains non-ASCII bytes.
    NonAscii { label: String },

    /// A label is empty.
    EmptyLabel,

    /// A label exceeds the compile-time length limit.
    LabelTooLong { label: String, limit: usize },

    /// The same label appears twice in one construction.
    DuplicateLabel { label: String },

    /// An uncertainty key references a base quantity that was not supplied.
    MissingBase { label: String },

    /// A lookup used a label that is not present.
    UnknownLabel { label: String },

    // ---- Covariance validation ----
    /// A diagonal covariance element is non-finite, non-positive, or below
    /// the numerical threshold.
    InvalidCovariance { index: usize, value: f64 },

    // ---- Table construction ----
    /// A column's length disagrees with the rest of the table.
    LengthMismatch { label: String, expected: usize, actual: usize },

    /// The construction mapping contained no base quantities.
    EmptyMapping,

    /// A filter relation token was not one of ==, <, <=, >, >=.
    UnknownRelation { token: String },

    /// An index into a sample was out of range.
    IndexOutOfRange { index: usize, len: usize },

    // ---- Matrix kernel ----
    /// A kernel failure while maintaining a covariance matrix (typically a
    /// singular matrix after an assignment).
    Matrix(MatrixError),
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NonAscii { label } => {
                write!(f, "Label contains non-ASCII characters: {label:?}")
            }
            DataError::EmptyLabel => {
                write!(f, "Labels must be nonempty.")
            }
            DataError::LabelTooLong { label, limit } => {
                write!(f, "Label exceeds the {limit}-character limit: {label:?}")
            }
            DataError::DuplicateLabel { label } => {
                write!(f, "Duplicate label: {label:?}")
            }
            DataError::MissingBase { label } => {
                write!(f, "Uncertainty key {label:?} has no matching base quantity.")
            }
            DataError::UnknownLabel { label } => {
                write!(f, "Unknown label: {label:?}")
            }
            DataError::InvalidCovariance { index, value } => {
                write!(
                    f,
                    "Covariance diagonal at index {index} must be finite and greater than \
                     the 1e-12 threshold; got: {value}"
                )
            }
            DataError::LengthMismatch { label, expected, actual } => {
                write!(
                    f,
                    "Column {label:?} has length {actual}; expected {expected} to match the \
                     rest of the mapping"
                )
            }
            DataError::EmptyMapping => {
                write!(f, "Construction mapping contains no base quantities.")
            }
            DataError::UnknownRelation { token } => {
                write!(f, "Unknown relation {token:?}; expected one of ==, <, <=, >, >=")
            }
            DataError::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} out of range for sample of size {len}")
            }
            DataError::Matrix(err) => err.fmt(f),
        }
    }
}

impl From<MatrixError> for DataError {
    fn from(err: MatrixError) -> DataError {
        DataError::Matrix(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Display formatting for representative variants.
    // - The From<MatrixError> bridge.
    //
    // They intentionally DO NOT cover:
    // - The conditions that raise each error (covered where they arise).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Ensure representative variants render their context and the matrix
    // bridge forwards the inner message.
    //
    // Given
    // -----
    // - An UnknownLabel, an InvalidCovariance, and a wrapped Singular.
    //
    // Expect
    // ------
    // - Messages include the label / index / inner text respectively.
    fn dataerror_display_includes_context() {
        let unknown = DataError::UnknownLabel { label: "fe_h".to_string() };
        assert_eq!(unknown.to_string(), "Unknown label: \"fe_h\"");

        let invalid = DataError::InvalidCovariance { index: 2, value: -1.0 };
        assert!(invalid.to_string().contains("index 2"));
        assert!(invalid.to_string().contains("-1"));

        let wrapped = DataError::from(MatrixError::Singular);
        assert_eq!(wrapped, DataError::Matrix(MatrixError::Singular));
        assert!(wrapped.to_string().contains("zero determinant"));
    }
}
