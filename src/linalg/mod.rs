//! Dense matrix kernel: the [`Matrix`] type, the [`MatrixView`] seam, and
//! the arithmetic the likelihood hot path is made of.
//!
//! The kernel is deliberately small. It supports exactly the shapes the
//! engine produces (1×N, N×N, N×1 with small N), reports shape problems as
//! [`MatrixError`] values rather than panicking, and exposes in-place
//! `*_into` variants so per-vertex loops can reuse scratch storage.

pub mod determinant;
pub mod errors;
pub mod matrix;

pub use determinant::{cofactors, determinant, invert};
pub use errors::{MatrixError, MatrixResult};
pub use matrix::{add, mul, mul_into, sub, sub_into, transpose, transpose_into, Matrix, MatrixView};
