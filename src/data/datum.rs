//! Measured data vectors with labeled components and covariant
//! uncertainties.
//!
//! Purpose
//! -------
//! [`Datum`] is one measurement in the observed space: a row vector of real
//! values, a label per component, and a [`CovarianceMatrix`] describing the
//! measurement uncertainties. The vector, the label array, and the
//! covariance axes share indexing.
//!
//! Key behaviors
//! -------------
//! - Construction from an ordered mapping of labels to reals, partitioning
//!   uncertainty keys (`err_*` / `*_err`) from base quantities. The
//!   covariance starts as the identity and absorbs `σ²` on the diagonal for
//!   every supplied uncertainty.
//! - Label-addressed reads and writes of vector components.
//! - Projection onto a label subset, carrying the matching covariance
//!   submatrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - `labels.len() == dim == cov.size()`, labels unique, dim ≥ 1.
//! - The label array is shared with the covariance behind an `Arc`; neither
//!   side mutates it after construction.
//!
//! Conventions
//! -----------
//! - Vector mutation goes through [`Datum::set_value`]; uncertainty mutation
//!   goes through the covariance ([`Datum::cov_mut`]) so the cached inverse
//!   stays fresh.
use crate::data::covariance::CovarianceMatrix;
use crate::data::errors::{DataError, DataResult};
use crate::data::labels::{label_index, uncertainty_base, validate_label};
use crate::linalg::MatrixView;
use ndarray::Array1;
use std::sync::Arc;

/// One measured vector with labels and covariant uncertainties.
///
/// Implements [`MatrixView`] as a 1×dim row vector, so the matrix kernel
/// consumes it directly when forming χ² differences.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    values: Array1<f64>,
    labels: Arc<[String]>,
    cov: CovarianceMatrix,
}

impl Datum {
    /// Build a datum from an ordered mapping of labels to real values.
    ///
    /// Keys are partitioned into base quantities and uncertainty keys; base
    /// quantities become the vector in iteration order, and each uncertainty
    /// key places `σ²` on the diagonal of the covariance (which otherwise
    /// starts as the identity).
    ///
    /// Errors
    /// ------
    /// - [`DataError::NonAscii`] / [`DataError::EmptyLabel`] /
    ///   [`DataError::LabelTooLong`] for malformed labels.
    /// - [`DataError::DuplicateLabel`] when any key repeats.
    /// - [`DataError::MissingBase`] for an uncertainty key whose base
    ///   quantity was not supplied.
    /// - [`DataError::EmptyMapping`] when no base quantities remain.
    /// - [`DataError::InvalidCovariance`] when a supplied `σ²` falls below
    ///   the numerical threshold.
    pub fn new<I>(mapping: I) -> DataResult<Datum>
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut base_labels: Vec<String> = Vec::new();
        let mut base_values: Vec<f64> = Vec::new();
        let mut uncertainties: Vec<(String, String, f64)> = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        for (label, value) in mapping {
            validate_label(&label)?;
            if seen.iter().any(|existing| existing == &label) {
                return Err(DataError::DuplicateLabel { label });
            }
            seen.push(label.clone());

            match uncertainty_base(&label) {
                Some(base) => uncertainties.push((label.clone(), base.to_string(), value)),
                None => {
                    base_labels.push(label);
                    base_values.push(value);
                }
            }
        }

        let mut sigmas = vec![1.0; base_labels.len()];
        for (key, base, sigma) in uncertainties {
            match label_index(&base_labels, &base) {
                Some(index) => sigmas[index] = sigma,
                None => return Err(DataError::MissingBase { label: key }),
            }
        }

        if base_labels.is_empty() {
            return Err(DataError::EmptyMapping);
        }

        let labels: Arc<[String]> = base_labels.into();
        let cov = CovarianceMatrix::from_sigmas(&sigmas)?.with_labels(labels.clone());
        Ok(Datum { values: Array1::from(base_values), labels, cov })
    }

    /// Dimensionality of the vector.
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Component labels, sharing indexing with the vector and covariance.
    pub fn keys(&self) -> &[String] {
        &self.labels
    }

    /// The vector component for `label`.
    ///
    /// Errors
    /// ------
    /// - [`DataError::UnknownLabel`] when the label is not present.
    pub fn value(&self, label: &str) -> DataResult<f64> {
        let index = label_index(&self.labels, label)
            .ok_or_else(|| DataError::UnknownLabel { label: label.to_string() })?;
        Ok(self.values[index])
    }

    /// Assign the vector component for `label`.
    ///
    /// Errors
    /// ------
    /// - [`DataError::UnknownLabel`] when the label is not present.
    pub fn set_value(&mut self, label: &str, value: f64) -> DataResult<()> {
        let index = label_index(&self.labels, label)
            .ok_or_else(|| DataError::UnknownLabel { label: label.to_string() })?;
        self.values[index] = value;
        Ok(())
    }

    /// The measurement covariance.
    pub fn cov(&self) -> &CovarianceMatrix {
        &self.cov
    }

    /// Mutable access to the covariance; writes keep its inverse fresh.
    pub fn cov_mut(&mut self) -> &mut CovarianceMatrix {
        &mut self.cov
    }

    /// New datum exposing only the requested labels, in request order.
    ///
    /// Requested labels the datum does not carry are skipped and duplicates
    /// keep their first occurrence. The covariance of the result is the
    /// submatrix over the selected rows and columns. Returns `Ok(None)` when
    /// no label matches.
    ///
    /// Errors
    /// ------
    /// - [`DataError::Matrix`] when the covariance submatrix is singular.
    pub fn project(&self, labels: &[&str]) -> DataResult<Option<Datum>> {
        let mut indices: Vec<usize> = Vec::new();
        for label in labels {
            if let Some(index) = label_index(&self.labels, label) {
                if !indices.contains(&index) {
                    indices.push(index);
                }
            }
        }
        if indices.is_empty() {
            return Ok(None);
        }

        let selected_labels: Arc<[String]> =
            indices.iter().map(|&i| self.labels[i].clone()).collect::<Vec<_>>().into();
        let values = Array1::from_iter(indices.iter().map(|&i| self.values[i]));
        let cov = self.cov.select(&indices)?.with_labels(selected_labels.clone());
        Ok(Some(Datum { values, labels: selected_labels, cov }))
    }
}

impl MatrixView for Datum {
    fn n_rows(&self) -> usize {
        1
    }

    fn n_cols(&self) -> usize {
        self.values.len()
    }

    fn entry(&self, _row: usize, col: usize) -> f64 {
        self.values[col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction: ordering, default and supplied uncertainties, and the
    //   error paths (duplicates, missing bases, malformed labels).
    // - Label-addressed reads and writes.
    // - Projection: value preservation, covariance subsetting, and the
    //   no-match case.
    //
    // They intentionally DO NOT cover:
    // - Covariance write policies (see data::covariance).
    // -------------------------------------------------------------------------

    fn pairs(entries: &[(&str, f64)]) -> Vec<(String, f64)> {
        entries.iter().map(|(label, value)| (label.to_string(), *value)).collect()
    }

    #[test]
    // Purpose
    // -------
    // Verify construction preserves base-key order, applies sigma-squared
    // diagonals, and defaults unsupplied uncertainties to 1.
    //
    // Given
    // -----
    // - Mapping {x: 1.0, x_err: 0.5, y: 2.0} (note err key between bases).
    //
    // Expect
    // ------
    // - keys() == ["x", "y"], values read back, cov diag == [0.25, 1.0].
    fn new_partitions_bases_and_uncertainties() {
        let datum = Datum::new(pairs(&[("x", 1.0), ("x_err", 0.5), ("y", 2.0)])).unwrap();

        assert_eq!(datum.dim(), 2);
        assert_eq!(datum.keys(), ["x".to_string(), "y".to_string()]);
        assert_eq!(datum.value("x").unwrap(), 1.0);
        assert_eq!(datum.value("y").unwrap(), 2.0);
        assert_eq!(datum.cov().entry(0, 0), 0.25);
        assert_eq!(datum.cov().entry(1, 1), 1.0);
        assert_eq!(datum.cov().entry(0, 1), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Ensure the err_ prefix spelling resolves to the same base as the
    // _err suffix spelling, even when the base appears after the key.
    //
    // Given
    // -----
    // - Mapping {err_age: 0.1, age: 10.0}.
    //
    // Expect
    // ------
    // - Construction succeeds with cov diag [0.01].
    fn new_resolves_prefix_uncertainties_in_any_order() {
        let datum = Datum::new(pairs(&[("err_age", 0.1), ("age", 10.0)])).unwrap();

        assert_eq!(datum.keys(), ["age".to_string()]);
        assert!((datum.cov().entry(0, 0) - 0.01).abs() < 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Exercise the construction error paths.
    //
    // Given
    // -----
    // - A duplicate key, an orphan uncertainty key, a non-ASCII key, and a
    //   mapping of uncertainty keys only.
    //
    // Expect
    // ------
    // - DuplicateLabel, MissingBase, NonAscii, and EmptyMapping.
    fn new_reports_construction_errors() {
        assert_eq!(
            Datum::new(pairs(&[("x", 1.0), ("x", 2.0)])).unwrap_err(),
            DataError::DuplicateLabel { label: "x".to_string() }
        );

        assert_eq!(
            Datum::new(pairs(&[("x", 1.0), ("y_err", 0.5)])).unwrap_err(),
            DataError::MissingBase { label: "y_err".to_string() }
        );

        assert_eq!(
            Datum::new(pairs(&[("\u{3b2}", 1.0)])).unwrap_err(),
            DataError::NonAscii { label: "\u{3b2}".to_string() }
        );

        assert_eq!(
            Datum::new(pairs(&[("x_err", 0.5)])).unwrap_err(),
            DataError::MissingBase { label: "x_err".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify label-addressed reads and writes, including the unknown-label
    // paths.
    //
    // Given
    // -----
    // - Datum {x: 1.0} with a write of 10.0 to "x".
    //
    // Expect
    // ------
    // - value round-trips; lookups on "z" fail with UnknownLabel.
    fn value_and_set_value_round_trip() {
        let mut datum = Datum::new(pairs(&[("x", 1.0)])).unwrap();

        datum.set_value("x", 10.0).unwrap();
        assert_eq!(datum.value("x").unwrap(), 10.0);

        assert_eq!(
            datum.value("z").unwrap_err(),
            DataError::UnknownLabel { label: "z".to_string() }
        );
        assert_eq!(
            datum.set_value("z", 0.0).unwrap_err(),
            DataError::UnknownLabel { label: "z".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify projection keeps values and the covariance submatrix, follows
    // the request order, and returns None when nothing matches.
    //
    // Given
    // -----
    // - Datum {x, y, z} with distinct uncertainties, projected onto
    //   ["z", "x"] and onto ["w"].
    //
    // Expect
    // ------
    // - The projection has keys ["z", "x"], the original values, and the
    //   matching sigma-squared diagonals.
    // - Projecting onto ["w"] yields None.
    fn project_selects_labels_and_covariance() {
        let datum = Datum::new(pairs(&[
            ("x", 1.0),
            ("y", 2.0),
            ("z", 3.0),
            ("x_err", 0.5),
            ("z_err", 2.0),
        ]))
        .unwrap();

        let projected = datum.project(&["z", "x"]).unwrap().unwrap();
        assert_eq!(projected.keys(), ["z".to_string(), "x".to_string()]);
        assert_eq!(projected.value("z").unwrap(), 3.0);
        assert_eq!(projected.value("x").unwrap(), 1.0);
        assert_eq!(projected.cov().entry(0, 0), 4.0);
        assert_eq!(projected.cov().entry(1, 1), 0.25);

        assert!(datum.project(&["w"]).unwrap().is_none());
    }

    #[test]
    // Purpose
    // -------
    // Check the MatrixView impl exposes the datum as a 1xdim row vector.
    //
    // Given
    // -----
    // - Datum {x: 1.0, y: 2.0}.
    //
    // Expect
    // ------
    // - n_rows == 1, n_cols == 2, entry(0, j) matches the vector.
    fn matrixview_exposes_row_vector() {
        let datum = Datum::new(pairs(&[("x", 1.0), ("y", 2.0)])).unwrap();

        assert_eq!(datum.n_rows(), 1);
        assert_eq!(datum.n_cols(), 2);
        assert_eq!(datum.entry(0, 0), 1.0);
        assert_eq!(datum.entry(0, 1), 2.0);
    }
}
