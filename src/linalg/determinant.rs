//! Determinants, cofactors, and inversion for square matrices.
//!
//! Purpose
//! -------
//! Complete the matrix kernel with the square-only routines the covariance
//! layer depends on: [`determinant`] by expansion along the axis with the
//! most zero entries, [`cofactors`], and [`invert`] via the adjugate.
//!
//! Key behaviors
//! -------------
//! - Sizes 1 and 2 use the closed forms.
//! - Larger sizes expand by minors along the "ideal axis" — the row or
//!   column containing the greatest number of zero entries — skipping zero
//!   pivots outright. Covariance matrices are diagonal-dominated in
//!   practice, which prunes the recursion heavily.
//! - [`invert`] returns `adjugate(m) / det(m)` and fails with
//!   [`MatrixError::Singular`] when the determinant vanishes.
//!
//! Invariants & assumptions
//! ------------------------
//! - All routines require square input and fail with
//!   [`MatrixError::NonSquare`] otherwise.
//! - The term at position `(i, j)` in an expansion carries the sign
//!   `(−1)^(i+j)`.
use crate::linalg::errors::{MatrixError, MatrixResult};
use crate::linalg::matrix::{transpose, Matrix, MatrixView};

fn check_square<A>(a: &A) -> MatrixResult<usize>
where
    A: MatrixView + ?Sized,
{
    if a.n_rows() == a.n_cols() {
        Ok(a.n_rows())
    } else {
        Err(MatrixError::NonSquare { n_rows: a.n_rows(), n_cols: a.n_cols() })
    }
}

/// Copy of `m` with row `skip_row` and column `skip_col` deleted.
fn minor<A>(m: &A, skip_row: usize, skip_col: usize) -> Matrix
where
    A: MatrixView + ?Sized,
{
    let mut out = Matrix::zeros(m.n_rows() - 1, m.n_cols() - 1);
    let mut out_i = 0;
    for i in 0..m.n_rows() {
        if i == skip_row {
            continue;
        }
        let mut out_j = 0;
        for j in 0..m.n_cols() {
            if j == skip_col {
                continue;
            }
            out[(out_i, out_j)] = m.entry(i, j);
            out_j += 1;
        }
        out_i += 1;
    }
    out
}

/// The row or column to expand along: the one holding the most zeros.
///
/// Returns `(along_row, index)`. Ties go to the first row encountered, then
/// the first column, which keeps the expansion deterministic.
fn ideal_axis<A>(m: &A, n: usize) -> (bool, usize)
where
    A: MatrixView + ?Sized,
{
    let mut best = (true, 0);
    let mut best_zeros = 0;
    for i in 0..n {
        let zeros = (0..n).filter(|&j| m.entry(i, j) == 0.0).count();
        if zeros > best_zeros {
            best = (true, i);
            best_zeros = zeros;
        }
    }
    for j in 0..n {
        let zeros = (0..n).filter(|&i| m.entry(i, j) == 0.0).count();
        if zeros > best_zeros {
            best = (false, j);
            best_zeros = zeros;
        }
    }
    best
}

fn sign(i: usize, j: usize) -> f64 {
    if (i + j) % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Determinant of a square matrix.
///
/// Errors
/// ------
/// - [`MatrixError::NonSquare`] when `m.n_rows != m.n_cols`.
pub fn determinant<A>(m: &A) -> MatrixResult<f64>
where
    A: MatrixView + ?Sized,
{
    let n = check_square(m)?;
    Ok(determinant_unchecked(m, n))
}

fn determinant_unchecked<A>(m: &A, n: usize) -> f64
where
    A: MatrixView + ?Sized,
{
    match n {
        1 => m.entry(0, 0),
        2 => m.entry(0, 0) * m.entry(1, 1) - m.entry(0, 1) * m.entry(1, 0),
        _ => {
            let (along_row, index) = ideal_axis(m, n);
            let mut total = 0.0;
            for k in 0..n {
                let (i, j) = if along_row { (index, k) } else { (k, index) };
                let pivot = m.entry(i, j);
                if pivot == 0.0 {
                    continue;
                }
                let sub = minor(m, i, j);
                total += sign(i, j) * pivot * determinant_unchecked(&sub, n - 1);
            }
            total
        }
    }
}

/// Matrix of cofactors: `C[i][j] = (−1)^(i+j) · det(minor(m, i, j))`.
///
/// Errors
/// ------
/// - [`MatrixError::NonSquare`] when `m.n_rows != m.n_cols`.
pub fn cofactors<A>(m: &A) -> MatrixResult<Matrix>
where
    A: MatrixView + ?Sized,
{
    let n = check_square(m)?;
    let mut out = Matrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            let sub = minor(m, i, j);
            out[(i, j)] = sign(i, j) * determinant_unchecked(&sub, n - 1);
        }
    }
    Ok(out)
}

/// Inverse of a square matrix via the adjugate: `transpose(cofactors(m)) /
/// det(m)`.
///
/// Errors
/// ------
/// - [`MatrixError::NonSquare`] when `m.n_rows != m.n_cols`.
/// - [`MatrixError::Singular`] when `det(m) == 0`.
pub fn invert<A>(m: &A) -> MatrixResult<Matrix>
where
    A: MatrixView + ?Sized,
{
    let n = check_square(m)?;
    if n == 1 {
        // The 1x1 adjugate is the identity; handle the scalar case directly.
        let det = m.entry(0, 0);
        if det == 0.0 {
            return Err(MatrixError::Singular);
        }
        let mut out = Matrix::zeros(1, 1);
        out[(0, 0)] = 1.0 / det;
        return Ok(out);
    }
    let det = determinant_unchecked(m, n);
    if det == 0.0 {
        return Err(MatrixError::Singular);
    }
    let mut out = transpose(&cofactors(m)?);
    for i in 0..n {
        for j in 0..n {
            out[(i, j)] /= det;
        }
    }
    Ok(out)
}
