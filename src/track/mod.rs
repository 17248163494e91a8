//! Model-predicted tracks: weighted, labeled vertex sequences describing an
//! infinitely thin curve through the observed space.
//!
//! Purpose
//! -------
//! A [`Track`] holds the model's predicted vectors — one row per vertex, one
//! labeled column per observable — plus a nonnegative density weight per
//! vertex and the evaluation flags the likelihood engine reads. The
//! piecewise-linear path through consecutive vertices is the curve; the
//! final vertex closes the track with a zero-length segment.
//!
//! Key behaviors
//! -------------
//! - Construction from a mapping of labels to equal-length sequences, with
//!   weights supplied either as a `weights` column or a separate argument
//!   (never both).
//! - Indexing by label (a column), by vertex (a labeled row including its
//!   weight), by both (a scalar), and by range (a sub-track).
//! - Projection onto a label subset in a requested order, the operation the
//!   engine uses to align the track with each datum.
//! - Thread-count policy: positive, `NoConcurrency` without the `parallel`
//!   feature, and clamped to the machine-wide cap with a logged warning.
//!
//! Invariants & assumptions
//! ------------------------
//! - `predictions` is `n_vertices × dim` with `n_vertices ≥ 1`, `dim ≥ 1`;
//!   `weights.len() == n_vertices`; labels unique and valid.
//! - Dimensions are fixed after construction; element values, weights, and
//!   flags may change freely.

pub mod errors;

use crate::data::labels::{label_index, validate_label};
use crate::data::DataError;
use crate::likelihood::threading::max_threads_allowed;
use errors::{TrackError, TrackResult};
use ndarray::Array2;
use std::ops::Range;
use tracing::warn;

/// The reserved column label that supplies vertex weights in a construction
/// mapping.
const WEIGHTS_KEY: &str = "weights";

/// A weighted, labeled sequence of predicted vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    labels: Vec<String>,
    predictions: Array2<f64>,
    weights: Vec<f64>,
    use_line_segment_corrections: bool,
    normalize_weights: bool,
    n_threads: usize,
}

impl Track {
    /// Build a track from a mapping of labels to equal-length sequences.
    ///
    /// A column labeled `weights` supplies the per-vertex weights; the
    /// `weights` argument is the alternative spelling. Weights default to 1
    /// per vertex. Flags start at their defaults: no line-segment
    /// corrections, weight normalization on, one thread.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::DuplicateWeights`] when both weight spellings are
    ///   supplied.
    /// - [`TrackError::LengthMismatch`] when sequence lengths disagree.
    /// - [`TrackError::EmptyTrack`] when there are no prediction columns or
    ///   no vertices.
    /// - [`TrackError::WeightCount`] / [`TrackError::InvalidWeight`] for
    ///   malformed weights.
    /// - [`TrackError::Label`] for malformed or duplicate labels.
    pub fn new<I>(columns: I, weights: Option<Vec<f64>>) -> TrackResult<Track>
    where
        I: IntoIterator<Item = (String, Vec<f64>)>,
    {
        let mut labels: Vec<String> = Vec::new();
        let mut prediction_columns: Vec<Vec<f64>> = Vec::new();
        let mut weights_column: Option<Vec<f64>> = None;

        for (label, column) in columns {
            if label == WEIGHTS_KEY {
                if weights_column.is_some() {
                    return Err(TrackError::Label(DataError::DuplicateLabel { label }));
                }
                weights_column = Some(column);
                continue;
            }
            validate_label(&label)?;
            if labels.iter().any(|existing| existing == &label) {
                return Err(TrackError::Label(DataError::DuplicateLabel { label }));
            }
            labels.push(label);
            prediction_columns.push(column);
        }

        if weights_column.is_some() && weights.is_some() {
            return Err(TrackError::DuplicateWeights);
        }

        if prediction_columns.is_empty() {
            return Err(TrackError::EmptyTrack { reason: "the mapping has no prediction columns" });
        }
        let n_vertices = prediction_columns[0].len();
        if n_vertices == 0 {
            return Err(TrackError::EmptyTrack { reason: "the mapping has zero vertices" });
        }
        for (label, column) in labels.iter().zip(&prediction_columns) {
            if column.len() != n_vertices {
                return Err(TrackError::LengthMismatch {
                    label: label.clone(),
                    expected: n_vertices,
                    actual: column.len(),
                });
            }
        }

        let weights = match weights_column.or(weights) {
            Some(weights) => {
                if weights.len() != n_vertices {
                    return Err(TrackError::WeightCount {
                        expected: n_vertices,
                        actual: weights.len(),
                    });
                }
                for (index, &value) in weights.iter().enumerate() {
                    if !value.is_finite() || value < 0.0 {
                        return Err(TrackError::InvalidWeight { index, value });
                    }
                }
                weights
            }
            None => vec![1.0; n_vertices],
        };

        let dim = labels.len();
        let mut predictions = Array2::zeros((n_vertices, dim));
        for (j, column) in prediction_columns.iter().enumerate() {
            for (i, &value) in column.iter().enumerate() {
                predictions[[i, j]] = value;
            }
        }

        Ok(Track {
            labels,
            predictions,
            weights,
            use_line_segment_corrections: false,
            normalize_weights: true,
            n_threads: 1,
        })
    }

    /// Assemble a track from already-validated parts, carrying flags over.
    /// Used by [`Track::slice`], [`Track::project`], and the engine's
    /// per-datum subsetting.
    pub(crate) fn from_parts(
        labels: Vec<String>,
        predictions: Array2<f64>,
        weights: Vec<f64>,
        template: &Track,
    ) -> Track {
        Track {
            labels,
            predictions,
            weights,
            use_line_segment_corrections: template.use_line_segment_corrections,
            normalize_weights: template.normalize_weights,
            n_threads: template.n_threads,
        }
    }

    /// Number of vertices.
    pub fn n_vertices(&self) -> usize {
        self.predictions.nrows()
    }

    /// Dimensionality of the observed space the track predicts.
    pub fn dim(&self) -> usize {
        self.predictions.ncols()
    }

    /// Column labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Per-vertex density weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// The full prediction table, vertices × labels.
    pub(crate) fn predictions(&self) -> &Array2<f64> {
        &self.predictions
    }

    /// The predicted values of `label` across all vertices.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::Label`] wrapping `UnknownLabel`.
    pub fn column(&self, label: &str) -> TrackResult<Vec<f64>> {
        let j = self.label_position(label)?;
        Ok(self.predictions.column(j).to_vec())
    }

    /// The labeled prediction at `vertex`, including a trailing
    /// `("weights", w)` entry.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::VertexOutOfRange`].
    pub fn vertex(&self, vertex: usize) -> TrackResult<Vec<(String, f64)>> {
        self.check_vertex(vertex)?;
        let mut out: Vec<(String, f64)> = self
            .labels
            .iter()
            .enumerate()
            .map(|(j, label)| (label.clone(), self.predictions[[vertex, j]]))
            .collect();
        out.push((WEIGHTS_KEY.to_string(), self.weights[vertex]));
        Ok(out)
    }

    /// The predicted value of `label` at `vertex`.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::Label`] wrapping `UnknownLabel`;
    ///   [`TrackError::VertexOutOfRange`].
    pub fn value(&self, label: &str, vertex: usize) -> TrackResult<f64> {
        let j = self.label_position(label)?;
        self.check_vertex(vertex)?;
        Ok(self.predictions[[vertex, j]])
    }

    /// Assign the predicted value of `label` at `vertex`.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::Label`] wrapping `UnknownLabel`;
    ///   [`TrackError::VertexOutOfRange`].
    pub fn set_value(&mut self, label: &str, vertex: usize, value: f64) -> TrackResult<()> {
        let j = self.label_position(label)?;
        self.check_vertex(vertex)?;
        self.predictions[[vertex, j]] = value;
        Ok(())
    }

    /// Assign the weight at `vertex`.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::VertexOutOfRange`];
    ///   [`TrackError::InvalidWeight`] for a negative or non-finite weight.
    pub fn set_weight(&mut self, vertex: usize, value: f64) -> TrackResult<()> {
        self.check_vertex(vertex)?;
        if !value.is_finite() || value < 0.0 {
            return Err(TrackError::InvalidWeight { index: vertex, value });
        }
        self.weights[vertex] = value;
        Ok(())
    }

    /// New track containing the vertices in `range`, carrying weights and
    /// flags over.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::VertexOutOfRange`] when the range end exceeds the
    ///   vertex count; [`TrackError::EmptyTrack`] for an empty range.
    pub fn slice(&self, range: Range<usize>) -> TrackResult<Track> {
        if range.end > self.n_vertices() {
            return Err(TrackError::VertexOutOfRange {
                index: range.end,
                len: self.n_vertices(),
            });
        }
        if range.is_empty() {
            return Err(TrackError::EmptyTrack { reason: "the requested slice has zero vertices" });
        }
        let predictions = self
            .predictions
            .slice(ndarray::s![range.start..range.end, ..])
            .to_owned();
        let weights = self.weights[range].to_vec();
        Ok(Track::from_parts(self.labels.clone(), predictions, weights, self))
    }

    /// New track restricted to `labels`, in the given order, carrying
    /// weights and flags over. Duplicate requests keep their first
    /// occurrence.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::Label`] wrapping `UnknownLabel` when the track does
    ///   not predict one of the requested labels.
    pub fn project(&self, labels: &[&str]) -> TrackResult<Track> {
        let mut indices: Vec<usize> = Vec::new();
        for label in labels {
            let j = self.label_position(label)?;
            if !indices.contains(&j) {
                indices.push(j);
            }
        }
        if indices.is_empty() {
            return Err(TrackError::EmptyTrack { reason: "no labels were requested" });
        }

        let selected_labels: Vec<String> =
            indices.iter().map(|&j| self.labels[j].clone()).collect();
        let mut predictions = Array2::zeros((self.n_vertices(), indices.len()));
        for (out_j, &j) in indices.iter().enumerate() {
            for i in 0..self.n_vertices() {
                predictions[[i, out_j]] = self.predictions[[i, j]];
            }
        }
        Ok(Track::from_parts(selected_labels, predictions, self.weights.clone(), self))
    }

    /// Whether per-segment marginalization corrections are applied.
    pub fn use_line_segment_corrections(&self) -> bool {
        self.use_line_segment_corrections
    }

    /// Enable or disable per-segment marginalization corrections.
    pub fn set_use_line_segment_corrections(&mut self, value: bool) {
        self.use_line_segment_corrections = value;
    }

    /// Whether the engine normalizes weights for the duration of an
    /// evaluation.
    pub fn normalize_weights(&self) -> bool {
        self.normalize_weights
    }

    /// Enable or disable weight normalization.
    pub fn set_normalize_weights(&mut self, value: bool) {
        self.normalize_weights = value;
    }

    /// Number of worker threads sample evaluations may use.
    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    /// Request a worker-thread count for sample evaluations.
    ///
    /// Requests above the machine-wide cap are clamped down and recorded
    /// with a warning.
    ///
    /// Errors
    /// ------
    /// - [`TrackError::InvalidThreadCount`] for zero.
    /// - [`TrackError::NoConcurrency`] for more than one thread in a build
    ///   without the `parallel` feature.
    pub fn set_n_threads(&mut self, n_threads: usize) -> TrackResult<()> {
        if n_threads == 0 {
            return Err(TrackError::InvalidThreadCount { value: n_threads });
        }
        if n_threads > 1 && !cfg!(feature = "parallel") {
            return Err(TrackError::NoConcurrency { requested: n_threads });
        }
        let cap = max_threads_allowed();
        if n_threads > cap {
            warn!("{n_threads} threads requested; clamping to the cap of {cap}");
            self.n_threads = cap;
        } else {
            self.n_threads = n_threads;
        }
        Ok(())
    }

    fn label_position(&self, label: &str) -> TrackResult<usize> {
        label_index(&self.labels, label)
            .ok_or_else(|| TrackError::Label(DataError::UnknownLabel { label: label.to_string() }))
    }

    fn check_vertex(&self, vertex: usize) -> TrackResult<()> {
        if vertex < self.n_vertices() {
            Ok(())
        } else {
            Err(TrackError::VertexOutOfRange { index: vertex, len: self.n_vertices() })
        }
    }
}
