//! Symmetric covariance matrices with cached inverses.
//!
//! Purpose
//! -------
//! Represent the measurement uncertainties of one datum (or a standalone
//! square covariance) and keep the arithmetic inverse — the object the χ²
//! kernel actually consumes — fresh across element assignments.
//!
//! Key behaviors
//! -------------
//! - Diagonal writes must be finite and above [`MIN_COVARIANCE_DIAGONAL`];
//!   off-diagonal writes mirror to the transposed position.
//! - Every successful write recomputes the cached inverse and determinant;
//!   a write that would make the matrix singular is rolled back and reported.
//! - Labels, when present, are the owning datum's label array shared behind
//!   an `Arc` — stored once, never mutated or freed here.
//!
//! Invariants & assumptions
//! ------------------------
//! - Storage is square at all times.
//! - `inv` is the arithmetic inverse of the payload up to numerical error,
//!   and `det` its determinant, after every public mutation.
//! - Negative off-diagonals are accepted; positive-definiteness is detected
//!   at invert time (a singular write fails) or by the likelihood engine's
//!   normalization (`det ≤ 0`).
use crate::data::errors::{DataError, DataResult};
use crate::data::labels::label_index;
use crate::linalg::{determinant, invert, Matrix, MatrixView};
use std::sync::Arc;

/// Smallest admissible diagonal covariance element.
///
/// Diagonals at or below this threshold would put χ² evaluation in the
/// regime of catastrophic cancellation; rejecting them at assignment time
/// keeps every cached inverse meaningful.
pub const MIN_COVARIANCE_DIAGONAL: f64 = 1e-12;

/// Square covariance matrix with a cached inverse and determinant.
///
/// Created either standalone ([`CovarianceMatrix::identity`],
/// [`CovarianceMatrix::from_matrix`]) or together with an owning
/// [`Datum`](crate::data::Datum), in which case it shares the datum's label
/// array and supports label-addressed element access.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    matrix: Matrix,
    inv: Matrix,
    det: f64,
    labels: Option<Arc<[String]>>,
}

impl CovarianceMatrix {
    /// The `size × size` identity covariance (unit uncertainties, no
    /// correlations).
    pub fn identity(size: usize) -> CovarianceMatrix {
        CovarianceMatrix {
            matrix: Matrix::identity(size),
            inv: Matrix::identity(size),
            det: 1.0,
            labels: None,
        }
    }

    /// Adopt a square matrix as a covariance, computing the initial inverse.
    ///
    /// The matrix is taken as given: symmetry is maintained by the write
    /// policy from here on, not retroactively imposed.
    ///
    /// Errors
    /// ------
    /// - [`DataError::Matrix`] wrapping `NonSquare` for rectangular input or
    ///   `Singular` when the matrix cannot be inverted.
    /// - [`DataError::InvalidCovariance`] when a diagonal element is
    ///   non-finite or not above [`MIN_COVARIANCE_DIAGONAL`].
    pub fn from_matrix(matrix: Matrix) -> DataResult<CovarianceMatrix> {
        let det = determinant(&matrix)?;
        for i in 0..matrix.n_rows() {
            let value = matrix[(i, i)];
            if !value.is_finite() || value <= MIN_COVARIANCE_DIAGONAL {
                return Err(DataError::InvalidCovariance { index: i, value });
            }
        }
        let inv = invert(&matrix)?;
        Ok(CovarianceMatrix { matrix, inv, det, labels: None })
    }

    /// Attach the owning datum's shared label array.
    pub(crate) fn with_labels(mut self, labels: Arc<[String]>) -> CovarianceMatrix {
        self.labels = Some(labels);
        self
    }

    /// Number of rows (equal to the number of columns).
    pub fn size(&self) -> usize {
        self.matrix.n_rows()
    }

    /// The covariance payload.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// The cached arithmetic inverse.
    pub fn inverse(&self) -> &Matrix {
        &self.inv
    }

    /// The cached determinant of the payload.
    pub fn determinant(&self) -> f64 {
        self.det
    }

    /// The shared label array, when this covariance belongs to a datum.
    pub fn keys(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// The element at `(row, col)`. Panics on out-of-bounds indices.
    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }

    /// Assign the element at `(row, col)`, mirroring off-diagonal writes and
    /// refreshing the cached inverse.
    ///
    /// Errors
    /// ------
    /// - [`DataError::InvalidCovariance`] for a diagonal value that is
    ///   non-finite or not above [`MIN_COVARIANCE_DIAGONAL`].
    /// - [`DataError::Matrix`] wrapping `Singular` when the write would make
    ///   the matrix non-invertible; the write is rolled back.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> DataResult<()> {
        if row == col {
            if !value.is_finite() || value <= MIN_COVARIANCE_DIAGONAL {
                return Err(DataError::InvalidCovariance { index: row, value });
            }
            let previous = self.matrix[(row, col)];
            self.matrix[(row, col)] = value;
            self.refresh().map_err(|err| {
                self.matrix[(row, col)] = previous;
                err
            })
        } else {
            let previous = (self.matrix[(row, col)], self.matrix[(col, row)]);
            self.matrix[(row, col)] = value;
            self.matrix[(col, row)] = value;
            self.refresh().map_err(|err| {
                self.matrix[(row, col)] = previous.0;
                self.matrix[(col, row)] = previous.1;
                err
            })
        }
    }

    /// Label-addressed [`CovarianceMatrix::entry`].
    ///
    /// Errors
    /// ------
    /// - [`DataError::UnknownLabel`] when this covariance carries no labels
    ///   or either label is absent.
    pub fn entry_by_label(&self, row: &str, col: &str) -> DataResult<f64> {
        let (i, j) = self.label_pair(row, col)?;
        Ok(self.matrix[(i, j)])
    }

    /// Label-addressed [`CovarianceMatrix::set`].
    ///
    /// Errors
    /// ------
    /// - [`DataError::UnknownLabel`] when this covariance carries no labels
    ///   or either label is absent.
    /// - Everything [`CovarianceMatrix::set`] reports.
    pub fn set_by_label(&mut self, row: &str, col: &str, value: f64) -> DataResult<()> {
        let (i, j) = self.label_pair(row, col)?;
        self.set(i, j, value)
    }

    /// Replace diagonal `index` with `sigma²` without touching labels.
    /// Used by datum construction to absorb `*_err` entries in bulk before
    /// the single initial inversion.
    pub(crate) fn from_sigmas(sigmas: &[f64]) -> DataResult<CovarianceMatrix> {
        let mut matrix = Matrix::identity(sigmas.len());
        for (i, sigma) in sigmas.iter().enumerate() {
            matrix[(i, i)] = sigma * sigma;
        }
        CovarianceMatrix::from_matrix(matrix)
    }

    /// Submatrix covariance for a projection onto the rows/columns in
    /// `indices`, carrying no labels (the projected datum attaches its own).
    pub(crate) fn select(&self, indices: &[usize]) -> DataResult<CovarianceMatrix> {
        CovarianceMatrix::from_matrix(self.matrix.select(indices, indices))
    }

    fn label_pair(&self, row: &str, col: &str) -> DataResult<(usize, usize)> {
        let labels = match &self.labels {
            Some(labels) => labels,
            None => return Err(DataError::UnknownLabel { label: row.to_string() }),
        };
        let i = label_index(labels, row)
            .ok_or_else(|| DataError::UnknownLabel { label: row.to_string() })?;
        let j = label_index(labels, col)
            .ok_or_else(|| DataError::UnknownLabel { label: col.to_string() })?;
        Ok((i, j))
    }

    fn refresh(&mut self) -> DataResult<()> {
        let det = determinant(&self.matrix)?;
        let inv = invert(&self.matrix)?;
        self.det = det;
        self.inv = inv;
        Ok(())
    }
}

impl MatrixView for CovarianceMatrix {
    fn n_rows(&self) -> usize {
        self.matrix.n_rows()
    }

    fn n_cols(&self) -> usize {
        self.matrix.n_cols()
    }

    fn entry(&self, row: usize, col: usize) -> f64 {
        self.matrix[(row, col)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::mul;
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::sync::Arc;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The mirror-on-write symmetry policy.
    // - Inverse freshness after arbitrary assignments.
    // - Diagonal threshold enforcement and rollback of singular writes.
    // - Label-addressed access through a shared label array.
    //
    // They intentionally DO NOT cover:
    // - Construction from datum mappings (see data::datum).
    // -------------------------------------------------------------------------

    fn shared_labels(names: &[&str]) -> Arc<[String]> {
        names.iter().map(|name| name.to_string()).collect::<Vec<_>>().into()
    }

    #[test]
    // Purpose
    // -------
    // Verify that any off-diagonal assignment is reflected at the mirrored
    // position.
    //
    // Given
    // -----
    // - A 4x4 identity covariance with seeded random off-diagonal writes
    //   (small, to stay invertible).
    //
    // Expect
    // ------
    // - entry(i, j) == entry(j, i) for every pair afterwards.
    fn set_mirrors_off_diagonal_assignments() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut cov = CovarianceMatrix::identity(4);

        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    cov.set(i, j, rng.gen_range(-0.2..0.2)).unwrap();
                }
            }
        }

        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(cov.entry(i, j), cov.entry(j, i));
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure the cached inverse is refreshed by every write: the product
    // with the payload stays within 1e-10 of the identity.
    //
    // Given
    // -----
    // - A 3x3 covariance mutated with seeded random diagonals (in [0.5, 2))
    //   and small off-diagonals.
    //
    // Expect
    // ------
    // - After each write, mul(C, C.inverse()) is elementwise within 1e-10
    //   of the identity.
    fn inverse_stays_fresh_across_assignments() {
        let mut rng = StdRng::seed_from_u64(33);
        let mut cov = CovarianceMatrix::identity(3);

        for i in 0..3 {
            cov.set(i, i, rng.gen_range(0.5..2.0)).unwrap();
            for j in 0..3 {
                if i != j {
                    cov.set(i, j, rng.gen_range(-0.1..0.1)).unwrap();
                }

                let prod = mul(cov.matrix(), cov.inverse()).unwrap();
                for r in 0..3 {
                    for c in 0..3 {
                        let expected = if r == c { 1.0 } else { 0.0 };
                        assert!((prod[(r, c)] - expected).abs() < 1e-10);
                    }
                }
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Ensure diagonal writes below the threshold (or non-finite) are
    // rejected with InvalidCovariance.
    //
    // Given
    // -----
    // - Writes of 0.0, -1.0, 1e-13, and NaN to a diagonal element.
    //
    // Expect
    // ------
    // - Every write fails with InvalidCovariance and leaves the element
    //   unchanged.
    fn set_rejects_invalid_diagonals() {
        let mut cov = CovarianceMatrix::identity(2);

        for bad in [0.0, -1.0, 1e-13, f64::NAN] {
            let err = cov.set(1, 1, bad).unwrap_err();
            match err {
                DataError::InvalidCovariance { index, .. } => assert_eq!(index, 1),
                other => panic!("expected InvalidCovariance, got {other:?}"),
            }
            assert_eq!(cov.entry(1, 1), 1.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that a write making the matrix singular is rolled back.
    //
    // Given
    // -----
    // - The 2x2 identity, then an off-diagonal write of 1.0 (which would
    //   produce the all-ones singular matrix).
    //
    // Expect
    // ------
    // - The write fails with a wrapped Singular error.
    // - The payload and inverse still describe the identity.
    fn singular_write_rolls_back() {
        let mut cov = CovarianceMatrix::identity(2);

        let err = cov.set(0, 1, 1.0).unwrap_err();
        assert_eq!(err, DataError::Matrix(crate::linalg::MatrixError::Singular));

        assert_eq!(cov.entry(0, 1), 0.0);
        assert_eq!(cov.entry(1, 0), 0.0);
        assert_eq!(cov.determinant(), 1.0);
        assert_eq!(cov.inverse()[(0, 0)], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Exercise label-addressed reads and writes through a shared label
    // array, plus the UnknownLabel paths.
    //
    // Given
    // -----
    // - A 2x2 identity covariance labeled ["x", "y"].
    //
    // Expect
    // ------
    // - set_by_label("x", "y", 0.3) mirrors to ("y", "x").
    // - Lookups with an unlisted label fail with UnknownLabel.
    // - A label-less covariance reports UnknownLabel for any label access.
    fn label_addressed_access_uses_shared_labels() {
        let labels = shared_labels(&["x", "y"]);
        let mut cov = CovarianceMatrix::identity(2).with_labels(labels);

        cov.set_by_label("x", "y", 0.3).unwrap();
        assert_eq!(cov.entry_by_label("y", "x").unwrap(), 0.3);

        assert_eq!(
            cov.entry_by_label("x", "z").unwrap_err(),
            DataError::UnknownLabel { label: "z".to_string() }
        );

        let unlabeled = CovarianceMatrix::identity(2);
        assert_eq!(
            unlabeled.entry_by_label("x", "x").unwrap_err(),
            DataError::UnknownLabel { label: "x".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Check from_matrix validation: rectangular and sub-threshold-diagonal
    // inputs are rejected.
    //
    // Given
    // -----
    // - A 2x3 zero matrix and a 2x2 matrix with a 1e-13 diagonal.
    //
    // Expect
    // ------
    // - NonSquare (wrapped) and InvalidCovariance respectively.
    fn from_matrix_validates_shape_and_diagonal() {
        let err = CovarianceMatrix::from_matrix(Matrix::zeros(2, 3)).unwrap_err();
        assert_eq!(
            err,
            DataError::Matrix(crate::linalg::MatrixError::NonSquare { n_rows: 2, n_cols: 3 })
        );

        let mut tiny = Matrix::identity(2);
        tiny[(0, 0)] = 1e-13;
        match CovarianceMatrix::from_matrix(tiny).unwrap_err() {
            DataError::InvalidCovariance { index, .. } => assert_eq!(index, 0),
            other => panic!("expected InvalidCovariance, got {other:?}"),
        }
    }
}
