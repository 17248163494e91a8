//! Errors for the dense matrix kernel (shape checks, squareness checks, and
//! singular inversions).
//!
//! This module defines [`MatrixError`], the error type shared by every kernel
//! routine in [`crate::linalg`]. Errors arise at the edge of an operation
//! (incompatible operands, a non-square input, a vanishing determinant) and
//! propagate to the caller unchanged.
//!
//! ## Conventions
//! - Shapes are reported as `(n_rows, n_cols)` pairs.
//! - Indices are 0-based.
//! - The kernel never panics on user-reachable conditions; panics are
//!   reserved for internal inconsistencies detected by higher layers.

/// Result alias for matrix-kernel operations that may produce
/// [`MatrixError`].
pub type MatrixResult<T> = Result<T, MatrixError>;

/// Unified error type for the dense matrix kernel.
///
/// Covers operand shape mismatches, non-square inputs to square-only
/// routines, and singular matrices passed to [`crate::linalg::invert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixError {
    /// Operand dimensions are incompatible for the named operation.
    ShapeMismatch { operation: &'static str, left: (usize, usize), right: (usize, usize) },

    /// A determinant or inverse was requested on a non-square matrix.
    NonSquare { n_rows: usize, n_cols: usize },

    /// The matrix has a zero determinant and cannot be inverted.
    Singular,
}

impl std::error::Error for MatrixError {}

impl std::fmt::Display for MatrixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatrixError::ShapeMismatch { operation, left, right } => {
                write!(
                    f,
                    "Matrix dimensions incompatible for {operation}: {}x{} and {}x{}",
                    left.0, left.1, right.0, right.1
                )
            }
            MatrixError::NonSquare { n_rows, n_cols } => {
                write!(f, "Matrix is not square: {n_rows}x{n_cols}")
            }
            MatrixError::Singular => {
                write!(f, "Matrix has a zero determinant and is not invertible.")
            }
        }
    }
}
