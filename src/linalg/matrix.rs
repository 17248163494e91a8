//! Dense real matrix type and the arithmetic kernel.
//!
//! Purpose
//! -------
//! Provide the [`Matrix`] container and the small set of arithmetic routines
//! the likelihood hot path is built from: addition, subtraction,
//! multiplication, and transposition, each in an allocating and an in-place
//! (`*_into`) form.
//!
//! Key behaviors
//! -------------
//! - [`Matrix`] owns its storage exclusively and is created zero-filled.
//! - Every routine is generic over [`MatrixView`], so row-vector types such
//!   as [`crate::data::Datum`] and the symmetric
//!   [`crate::data::CovarianceMatrix`] feed the kernel directly without
//!   copies or ownership transfer.
//! - The `*_into` variants resize and overwrite a caller-supplied output
//!   matrix, allowing scratch reuse in per-vertex loops.
//!
//! Invariants & assumptions
//! ------------------------
//! - Storage holds exactly `n_rows × n_cols` values at all times.
//! - The hot path multiplies 1×N, N×N, and N×1 shapes with N small
//!   (typically ≤ 20), so the naive triple loop is sufficient.
//!
//! Conventions
//! -----------
//! - Element access is `(row, col)`, 0-based.
//! - Shape mismatches are reported via
//!   [`MatrixError::ShapeMismatch`](crate::linalg::MatrixError), never by
//!   panicking; out-of-bounds indexing through `Index` panics like any other
//!   Rust container.
use crate::linalg::errors::{MatrixError, MatrixResult};
use ndarray::Array2;

/// Read-only view of a 2-D real matrix: known dimensions plus element access.
///
/// This is the seam that lets the kernel operate on anything matrix-shaped.
/// [`Matrix`] implements it over its own storage; `Datum` exposes itself as a
/// 1×dim row vector; `CovarianceMatrix` as its square payload. Kernel
/// routines take views and return newly owned [`Matrix`] values — ownership
/// always stays with the concrete type.
pub trait MatrixView {
    /// Number of rows in the viewed matrix.
    fn n_rows(&self) -> usize;

    /// Number of columns in the viewed matrix.
    fn n_cols(&self) -> usize;

    /// The element at `(row, col)`. Implementations may panic on
    /// out-of-bounds indices; callers stay within `n_rows × n_cols`.
    fn entry(&self, row: usize, col: usize) -> f64;
}

/// Dense, exclusively owned real matrix.
///
/// A thin wrapper over `ndarray::Array2<f64>` that fixes the element type
/// and carries the kernel's creation conventions: new matrices are
/// zero-filled, and dimensions only change through the `*_into` resize path.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    /// A zero-filled `n_rows × n_cols` matrix.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Matrix {
        Matrix { data: Array2::zeros((n_rows, n_cols)) }
    }

    /// The `n × n` identity matrix.
    pub fn identity(n: usize) -> Matrix {
        let mut m = Matrix::zeros(n, n);
        for i in 0..n {
            m.data[[i, i]] = 1.0;
        }
        m
    }

    /// Wrap an existing 2-D array without copying.
    pub fn from_array(data: Array2<f64>) -> Matrix {
        Matrix { data }
    }

    /// Copy of the matrix restricted to the given rows and columns, in the
    /// given order. Callers guarantee the indices are in bounds.
    pub(crate) fn select(&self, rows: &[usize], cols: &[usize]) -> Matrix {
        let mut out = Matrix::zeros(rows.len(), cols.len());
        for (i, &r) in rows.iter().enumerate() {
            for (j, &c) in cols.iter().enumerate() {
                out.data[[i, j]] = self.data[[r, c]];
            }
        }
        out
    }

    /// Reshape the storage to `n_rows × n_cols` if it differs. Contents are
    /// unspecified afterwards; every `*_into` routine overwrites all entries.
    fn reshape(&mut self, n_rows: usize, n_cols: usize) {
        if self.data.dim() != (n_rows, n_cols) {
            self.data = Array2::zeros((n_rows, n_cols));
        }
    }
}

impl MatrixView for Matrix {
    fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    fn entry(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }
}

impl std::ops::Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[[row, col]]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[[row, col]]
    }
}

fn check_same_shape<A, B>(operation: &'static str, a: &A, b: &B) -> MatrixResult<()>
where
    A: MatrixView + ?Sized,
    B: MatrixView + ?Sized,
{
    if a.n_rows() == b.n_rows() && a.n_cols() == b.n_cols() {
        Ok(())
    } else {
        Err(MatrixError::ShapeMismatch {
            operation,
            left: (a.n_rows(), a.n_cols()),
            right: (b.n_rows(), b.n_cols()),
        })
    }
}

/// Elementwise sum `a + b`.
///
/// Errors
/// ------
/// - [`MatrixError::ShapeMismatch`] when the operands differ in either
///   dimension.
pub fn add<A, B>(a: &A, b: &B) -> MatrixResult<Matrix>
where
    A: MatrixView + ?Sized,
    B: MatrixView + ?Sized,
{
    check_same_shape("addition", a, b)?;
    let mut out = Matrix::zeros(a.n_rows(), a.n_cols());
    for i in 0..a.n_rows() {
        for j in 0..a.n_cols() {
            out.data[[i, j]] = a.entry(i, j) + b.entry(i, j);
        }
    }
    Ok(out)
}

/// Elementwise difference `a − b`.
///
/// Errors
/// ------
/// - [`MatrixError::ShapeMismatch`] when the operands differ in either
///   dimension.
pub fn sub<A, B>(a: &A, b: &B) -> MatrixResult<Matrix>
where
    A: MatrixView + ?Sized,
    B: MatrixView + ?Sized,
{
    let mut out = Matrix::zeros(a.n_rows(), a.n_cols());
    sub_into(a, b, &mut out)?;
    Ok(out)
}

/// Elementwise difference written into `out`, which is resized as needed and
/// returned through the `Ok` arm by mutation.
///
/// Errors
/// ------
/// - [`MatrixError::ShapeMismatch`] when the operands differ in either
///   dimension; `out` is untouched in that case.
pub fn sub_into<A, B>(a: &A, b: &B, out: &mut Matrix) -> MatrixResult<()>
where
    A: MatrixView + ?Sized,
    B: MatrixView + ?Sized,
{
    check_same_shape("subtraction", a, b)?;
    out.reshape(a.n_rows(), a.n_cols());
    for i in 0..a.n_rows() {
        for j in 0..a.n_cols() {
            out.data[[i, j]] = a.entry(i, j) - b.entry(i, j);
        }
    }
    Ok(())
}

/// Matrix product `a · b`; the result has shape `a.n_rows × b.n_cols`.
///
/// The naive triple loop is deliberate: the likelihood hot path only
/// multiplies 1×N, N×N, and N×1 shapes with small N.
///
/// Errors
/// ------
/// - [`MatrixError::ShapeMismatch`] when `a.n_cols != b.n_rows`.
pub fn mul<A, B>(a: &A, b: &B) -> MatrixResult<Matrix>
where
    A: MatrixView + ?Sized,
    B: MatrixView + ?Sized,
{
    let mut out = Matrix::zeros(a.n_rows(), b.n_cols());
    mul_into(a, b, &mut out)?;
    Ok(out)
}

/// Matrix product written into `out`, which is resized as needed.
///
/// Errors
/// ------
/// - [`MatrixError::ShapeMismatch`] when `a.n_cols != b.n_rows`; `out` is
///   untouched in that case.
pub fn mul_into<A, B>(a: &A, b: &B, out: &mut Matrix) -> MatrixResult<()>
where
    A: MatrixView + ?Sized,
    B: MatrixView + ?Sized,
{
    if a.n_cols() != b.n_rows() {
        return Err(MatrixError::ShapeMismatch {
            operation: "multiplication",
            left: (a.n_rows(), a.n_cols()),
            right: (b.n_rows(), b.n_cols()),
        });
    }
    out.reshape(a.n_rows(), b.n_cols());
    for i in 0..a.n_rows() {
        for j in 0..b.n_cols() {
            let mut acc = 0.0;
            for k in 0..a.n_cols() {
                acc += a.entry(i, k) * b.entry(k, j);
            }
            out.data[[i, j]] = acc;
        }
    }
    Ok(())
}

/// Transpose: `out[j][i] = a[i][j]`.
pub fn transpose<A>(a: &A) -> Matrix
where
    A: MatrixView + ?Sized,
{
    let mut out = Matrix::zeros(a.n_cols(), a.n_rows());
    transpose_into(a, &mut out);
    out
}

/// Transpose written into `out`, which is resized as needed.
pub fn transpose_into<A>(a: &A, out: &mut Matrix)
where
    A: MatrixView + ?Sized,
{
    out.reshape(a.n_cols(), a.n_rows());
    for i in 0..a.n_rows() {
        for j in 0..a.n_cols() {
            out.data[[j, i]] = a.entry(i, j);
        }
    }
}
