//! Ordered collections of data vectors, possibly heterogeneous.
//!
//! Purpose
//! -------
//! [`Sample`] owns an ordered list of [`Datum`]s whose label sets may
//! differ: difficult-to-measure quantities need not be available for every
//! datum. The union of datum labels, in first-appearance order, is the
//! sample's observable set.
//!
//! Key behaviors
//! -------------
//! - Shadow labels: reading a label the sample exposes but a given datum
//!   lacks yields `NaN` rather than an error. The shadow set is derived
//!   (union ∖ datum labels) so it stays consistent across `add` and
//!   `project` with no bookkeeping.
//! - Filtering by a labeled comparison produces a new sample, preserving
//!   relative order; the original is unchanged. An empty result is a
//!   warning, not an error.
//! - Table construction accepts the `*_err` uncertainty convention, with
//!   `NaN` entries marking quantities a row does not measure.
//!
//! Invariants & assumptions
//! ------------------------
//! - Data are owned by the sample once added and keep insertion order.
//! - `keys` lists every label carried by at least one datum, each exactly
//!   once, ordered by first appearance.
use crate::data::datum::Datum;
use crate::data::errors::{DataError, DataResult};
use crate::data::labels::uncertainty_base;
use std::ops::Range;
use std::str::FromStr;
use tracing::warn;

/// Comparison relation for [`Sample::filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Relation {
    /// Whether `lhs <relation> rhs` holds.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Relation::Equal => lhs == rhs,
            Relation::LessThan => lhs < rhs,
            Relation::LessThanOrEqual => lhs <= rhs,
            Relation::GreaterThan => lhs > rhs,
            Relation::GreaterThanOrEqual => lhs >= rhs,
        }
    }

    /// The source-text spelling of the relation.
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Equal => "==",
            Relation::LessThan => "<",
            Relation::LessThanOrEqual => "<=",
            Relation::GreaterThan => ">",
            Relation::GreaterThanOrEqual => ">=",
        }
    }
}

impl FromStr for Relation {
    type Err = DataError;

    fn from_str(token: &str) -> DataResult<Relation> {
        match token {
            "==" => Ok(Relation::Equal),
            "<" => Ok(Relation::LessThan),
            "<=" => Ok(Relation::LessThanOrEqual),
            ">" => Ok(Relation::GreaterThan),
            ">=" => Ok(Relation::GreaterThanOrEqual),
            _ => Err(DataError::UnknownRelation { token: token.to_string() }),
        }
    }
}

/// Ordered, growable, possibly heterogeneous collection of data vectors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sample {
    data: Vec<Datum>,
    keys: Vec<String>,
}

impl Sample {
    /// An empty sample.
    pub fn new() -> Sample {
        Sample::default()
    }

    /// Build a sample from a mapping of labels to equal-length columns.
    ///
    /// `<key>_err` / `err_<key>` columns supply per-row 1-σ uncertainties
    /// for `<key>`. A `NaN` base entry means the row does not measure that
    /// quantity; its uncertainty entry (if any) is ignored, and a `NaN`
    /// uncertainty falls back to the default σ = 1. Rows measuring nothing
    /// at all are skipped.
    ///
    /// Errors
    /// ------
    /// - [`DataError::LengthMismatch`] when column lengths disagree.
    /// - [`DataError::MissingBase`] for an uncertainty column with no base
    ///   column.
    /// - Everything [`Datum::new`] reports for a single row.
    pub fn from_table<I>(columns: I) -> DataResult<Sample>
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let columns: Vec<(String, Vec<f64>)> = columns.into_iter().collect();
        let n_rows = match columns.first() {
            Some((_, first)) => first.len(),
            None => return Ok(Sample::new()),
        };
        for (label, column) in &columns {
            if column.len() != n_rows {
                return Err(DataError::LengthMismatch {
                    label: label.clone(),
                    expected: n_rows,
                    actual: column.len(),
                });
            }
        }
        for (label, _) in &columns {
            if let Some(base) = uncertainty_base(label) {
                if !columns.iter().any(|(other, _)| other == base) {
                    return Err(DataError::MissingBase { label: label.clone() });
                }
            }
        }

        let mut sample = Sample::new();
        for row in 0..n_rows {
            let mut pairs: Vec<(String, f64)> = Vec::new();
            for (label, column) in &columns {
                let value = column[row];
                if value.is_nan() {
                    continue;
                }
                match uncertainty_base(label) {
                    Some(base) => {
                        let base_present = columns
                            .iter()
                            .any(|(other, values)| other == base && !values[row].is_nan());
                        if base_present {
                            pairs.push((label.clone(), value));
                        }
                    }
                    None => pairs.push((label.clone(), value)),
                }
            }
            if pairs.is_empty() {
                continue;
            }
            sample.add(Datum::new(pairs)?);
        }
        Ok(sample)
    }

    /// Append a datum, extending the observable set with any new labels.
    pub fn add(&mut self, datum: Datum) {
        for label in datum.keys() {
            if !self.keys.iter().any(|existing| existing == label) {
                self.keys.push(label.clone());
            }
        }
        self.data.push(datum);
    }

    /// Number of data vectors.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the sample holds no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The union of datum labels, in first-appearance order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The datum at `index`.
    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.data.get(index)
    }

    /// Iterate the data in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Datum> {
        self.data.iter()
    }

    /// Per-datum values of `label`, with `NaN` where a datum lacks it.
    ///
    /// Errors
    /// ------
    /// - [`DataError::UnknownLabel`] when no datum carries the label.
    pub fn column(&self, label: &str) -> DataResult<Vec<f64>> {
        if !self.keys.iter().any(|existing| existing == label) {
            return Err(DataError::UnknownLabel { label: label.to_string() });
        }
        Ok(self.data.iter().map(|datum| datum.value(label).unwrap_or(f64::NAN)).collect())
    }

    /// The value of `label` for the datum at `index`; `NaN` when that datum
    /// does not measure the label.
    ///
    /// Errors
    /// ------
    /// - [`DataError::IndexOutOfRange`] for a bad index.
    /// - [`DataError::UnknownLabel`] when no datum carries the label.
    pub fn value(&self, label: &str, index: usize) -> DataResult<f64> {
        if index >= self.data.len() {
            return Err(DataError::IndexOutOfRange { index, len: self.data.len() });
        }
        if !self.keys.iter().any(|existing| existing == label) {
            return Err(DataError::UnknownLabel { label: label.to_string() });
        }
        Ok(self.data[index].value(label).unwrap_or(f64::NAN))
    }

    /// New sample holding copies of the data in `range`, in order.
    ///
    /// Errors
    /// ------
    /// - [`DataError::IndexOutOfRange`] when the range end exceeds the
    ///   sample size.
    pub fn slice(&self, range: Range<usize>) -> DataResult<Sample> {
        if range.end > self.data.len() {
            return Err(DataError::IndexOutOfRange { index: range.end, len: self.data.len() });
        }
        let mut out = Sample::new();
        for datum in &self.data[range] {
            out.add(datum.clone());
        }
        Ok(out)
    }

    /// New sample of the data for which `datum[label] <relation> value`
    /// holds. Data lacking the label are retained iff `keep_missing`.
    /// Relative order is preserved. An empty result emits a warning.
    ///
    /// Errors
    /// ------
    /// - [`DataError::UnknownLabel`] when no datum carries the label.
    pub fn filter(
        &self,
        label: &str,
        relation: Relation,
        value: f64,
        keep_missing: bool,
    ) -> DataResult<Sample> {
        if !self.keys.iter().any(|existing| existing == label) {
            return Err(DataError::UnknownLabel { label: label.to_string() });
        }
        let mut out = Sample::new();
        for datum in &self.data {
            let keep = match datum.value(label) {
                Ok(measured) => relation.holds(measured, value),
                Err(_) => keep_missing,
            };
            if keep {
                out.add(datum.clone());
            }
        }
        if out.is_empty() {
            warn!(
                "Sample filter {label:?} {} {value} with keep_missing = {keep_missing} \
                 produced an empty sample",
                relation.symbol()
            );
        }
        Ok(out)
    }

    /// Project every datum onto `labels`, dropping data with no matching
    /// label.
    ///
    /// Errors
    /// ------
    /// - [`DataError::Matrix`] when a projected covariance submatrix is
    ///   singular.
    pub fn project(&self, labels: &[&str]) -> DataResult<Sample> {
        let mut out = Sample::new();
        for datum in &self.data {
            if let Some(projected) = datum.project(labels)? {
                out.add(projected);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Key-union maintenance and shadow-label reads (NaN).
    // - Table construction with NaN-marked missing entries and *_err columns.
    // - Filter semantics: relations, order stability, keep_missing, and the
    //   unknown-label error.
    // - Slicing and projection.
    //
    // They intentionally DO NOT cover:
    // - Per-datum construction validation (see data::datum).
    // -------------------------------------------------------------------------

    fn datum(entries: &[(&str, f64)]) -> Datum {
        Datum::new(entries.iter().map(|(label, value)| (label.to_string(), *value))).unwrap()
    }

    fn two_datum_sample() -> Sample {
        let mut sample = Sample::new();
        sample.add(datum(&[("x", 1.0), ("y", 10.0)]));
        sample.add(datum(&[("x", 2.0)]));
        sample
    }

    #[test]
    // Purpose
    // -------
    // Verify the key union keeps first-appearance order and that labels
    // absent from a datum read back as NaN (shadow labels).
    //
    // Given
    // -----
    // - Data {x, y} then {x} then {z}.
    //
    // Expect
    // ------
    // - keys() == [x, y, z].
    // - column("y") == [10.0, NaN, NaN]; column("q") is UnknownLabel.
    fn add_maintains_key_union_and_shadows() {
        let mut sample = two_datum_sample();
        sample.add(datum(&[("z", 5.0)]));

        assert_eq!(
            sample.keys(),
            ["x".to_string(), "y".to_string(), "z".to_string()]
        );

        let y = sample.column("y").unwrap();
        assert_eq!(y[0], 10.0);
        assert!(y[1].is_nan());
        assert!(y[2].is_nan());

        assert!(sample.value("z", 1).unwrap().is_nan());
        assert_eq!(sample.value("z", 2).unwrap(), 5.0);

        assert_eq!(
            sample.column("q").unwrap_err(),
            DataError::UnknownLabel { label: "q".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify table construction: NaN marks a missing measurement, *_err
    // columns set per-row uncertainties, and rows with no measurements are
    // skipped.
    //
    // Given
    // -----
    // - Columns x = [1, 2, NaN], x_err = [0.5, NaN, 0.5], y = [3, NaN, NaN].
    //
    // Expect
    // ------
    // - Two data: {x: 1 (sigma 0.5), y: 3} and {x: 2 (default sigma)}.
    fn from_table_handles_missing_entries() {
        let sample = Sample::from_table([
            ("x".to_string(), vec![1.0, 2.0, f64::NAN]),
            ("x_err".to_string(), vec![0.5, f64::NAN, 0.5]),
            ("y".to_string(), vec![3.0, f64::NAN, f64::NAN]),
        ])
        .unwrap();

        assert_eq!(sample.len(), 2);

        let first = sample.get(0).unwrap();
        assert_eq!(first.keys(), ["x".to_string(), "y".to_string()]);
        assert_eq!(first.cov().entry(0, 0), 0.25);

        let second = sample.get(1).unwrap();
        assert_eq!(second.keys(), ["x".to_string()]);
        assert_eq!(second.cov().entry(0, 0), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Exercise table-construction error paths.
    //
    // Given
    // -----
    // - Columns of unequal length; an x_err column with no x column.
    //
    // Expect
    // ------
    // - LengthMismatch naming the offending column; MissingBase.
    fn from_table_reports_errors() {
        assert_eq!(
            Sample::from_table([
                ("x".to_string(), vec![1.0, 2.0]),
                ("y".to_string(), vec![1.0]),
            ])
            .unwrap_err(),
            DataError::LengthMismatch { label: "y".to_string(), expected: 2, actual: 1 }
        );

        assert_eq!(
            Sample::from_table([("x_err".to_string(), vec![0.5])]).unwrap_err(),
            DataError::MissingBase { label: "x_err".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify filter keeps relative order, honors each relation, and
    // applies keep_missing to data lacking the label.
    //
    // Given
    // -----
    // - Data with x = 1, 2, 3 and one datum without x.
    //
    // Expect
    // ------
    // - x > 1.5 keeps [2, 3] in order; keep_missing retains the x-less
    //   datum; == matches exactly; unknown labels error.
    fn filter_preserves_order_and_handles_missing() {
        let mut sample = Sample::new();
        sample.add(datum(&[("x", 1.0)]));
        sample.add(datum(&[("x", 2.0)]));
        sample.add(datum(&[("y", 7.0)]));
        sample.add(datum(&[("x", 3.0)]));

        let filtered = sample.filter("x", Relation::GreaterThan, 1.5, false).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.get(0).unwrap().value("x").unwrap(), 2.0);
        assert_eq!(filtered.get(1).unwrap().value("x").unwrap(), 3.0);

        let with_missing = sample.filter("x", Relation::GreaterThan, 1.5, true).unwrap();
        assert_eq!(with_missing.len(), 3);
        assert_eq!(with_missing.get(1).unwrap().value("y").unwrap(), 7.0);

        let exact = sample.filter("x", Relation::Equal, 2.0, false).unwrap();
        assert_eq!(exact.len(), 1);

        // Empty results warn but are not errors.
        let empty = sample.filter("x", Relation::LessThan, 0.0, false).unwrap();
        assert!(empty.is_empty());

        assert_eq!(
            sample.filter("q", Relation::Equal, 0.0, false).unwrap_err(),
            DataError::UnknownLabel { label: "q".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify relation parsing from source-text tokens.
    //
    // Given
    // -----
    // - The five supported tokens and one bogus token.
    //
    // Expect
    // ------
    // - Each token maps to its variant; "=<" is UnknownRelation.
    fn relation_parses_from_tokens() {
        assert_eq!("==".parse::<Relation>().unwrap(), Relation::Equal);
        assert_eq!("<".parse::<Relation>().unwrap(), Relation::LessThan);
        assert_eq!("<=".parse::<Relation>().unwrap(), Relation::LessThanOrEqual);
        assert_eq!(">".parse::<Relation>().unwrap(), Relation::GreaterThan);
        assert_eq!(">=".parse::<Relation>().unwrap(), Relation::GreaterThanOrEqual);

        assert_eq!(
            "=<".parse::<Relation>().unwrap_err(),
            DataError::UnknownRelation { token: "=<".to_string() }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify slicing copies the selected rows and projection drops data
    // with no matching label while recomputing the key union.
    //
    // Given
    // -----
    // - The two-datum sample {x, y} / {x}, sliced and projected onto ["y"].
    //
    // Expect
    // ------
    // - slice(1..2) holds only the second datum.
    // - project(["y"]) holds only the first datum, with keys == ["y"].
    // - An out-of-range slice errors.
    fn slice_and_project_build_new_samples() {
        let sample = two_datum_sample();

        let tail = sample.slice(1..2).unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail.keys(), ["x".to_string()]);

        let projected = sample.project(&["y"]).unwrap();
        assert_eq!(projected.len(), 1);
        assert_eq!(projected.keys(), ["y".to_string()]);
        assert_eq!(projected.get(0).unwrap().value("y").unwrap(), 10.0);

        assert_eq!(
            sample.slice(1..3).unwrap_err(),
            DataError::IndexOutOfRange { index: 3, len: 2 }
        );
    }
}
