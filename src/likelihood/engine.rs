//! The likelihood engine: χ² contributions, line-segment corrections, and
//! the per-datum and per-sample log-likelihoods.
//!
//! Purpose
//! -------
//! Compute the natural logarithm of the likelihood that a datum, or a whole
//! sample, would be observed given a model-predicted [`Track`] through the
//! observed space. Each datum sees the track projected onto its own labels,
//! so heterogeneous samples are handled per datum with no special casing.
//!
//! Key behaviors
//! -------------
//! - Per vertex: contribution `w · exp(−χ²/2) · Δm · β`, with χ² taken
//!   against the datum's cached inverse covariance, `Δm` the Euclidean
//!   length of the segment leaving the vertex (zero at the final vertex),
//!   and `β` an optional marginalization over the segment's finite length.
//! - Per datum: the vertex sum divided by the Gaussian normalization
//!   `sqrt(2π·det(cov))`, then logged. A zero sum is −∞, not an error.
//! - Per sample: the thread-partitioned sum of per-datum values, minus the
//!   total track weight when weights are not being normalized.
//! - Weight normalization never mutates the input track: it is a scalar
//!   multiplier threaded through the vertex loop, and the public per-datum
//!   entry applies the same normalization the sample entry does.
//!
//! Invariants & assumptions
//! ------------------------
//! - Kernel shape failures during evaluation indicate an internal
//!   inconsistency (the projection already aligned every operand) and abort
//!   with a diagnostic rather than returning an error.
//! - The Track and Sample are read-only for the duration of a call; scratch
//!   matrices are per call and per thread.
use crate::data::{DataError, Datum, Sample};
use crate::likelihood::errors::{LikelihoodError, LikelihoodResult};
use crate::likelihood::threading;
use crate::linalg::{mul, mul_into, sub, sub_into, transpose, transpose_into, Matrix, MatrixView};
use crate::quadrature::Integral;
use crate::track::errors::TrackError;
use crate::track::Track;
use std::f64::consts::PI;

/// Maximum allowed relative error in a line-segment correction integral.
pub const LINE_SEGMENT_CORRECTION_TOLERANCE: f64 = 1e-3;

/// Starting number of quadrature bins for a line-segment correction.
pub const LINE_SEGMENT_CORRECTION_MIN_BINS: usize = 64;

/// Bin-count safeguard for non-convergent line-segment corrections; the
/// last estimate is used regardless.
pub const LINE_SEGMENT_CORRECTION_MAX_BINS: usize = 1_000_000;

/// Magnitude target for normalized weights.
///
/// Normalization replaces each weight `w` by `w / W̄` with
/// `W̄ = sum(w) / (WEIGHT_MAGNITUDE_SCALE · n_vertices)`. The scale keeps
/// per-contribution magnitudes in a range that stays within double
/// precision for common sample sizes.
const WEIGHT_MAGNITUDE_SCALE: f64 = 1000.0;

/// Natural log of the likelihood that the whole sample would be observed
/// given the track.
///
/// The per-datum terms are summed over `track.n_threads()` workers (each
/// taking one contiguous slice of the sample, reduced in index order). When
/// `track.normalize_weights()` is unset, the total track weight is
/// subtracted from the sum, re-centering the likelihood against the number
/// of observed points the density model predicts; under normalization that
/// term cancels.
///
/// Errors
/// ------
/// - [`LikelihoodError::ProjectionIncomplete`] when the track lacks a label
///   some datum measures.
/// - [`LikelihoodError::Singular`] for a datum covariance with a
///   non-positive determinant.
/// - [`LikelihoodError::ThreadPool`] when the worker pool cannot be built.
pub fn loglikelihood_sample(sample: &Sample, track: &Track) -> LikelihoodResult<f64> {
    let multiplier = weight_multiplier(track);
    let eval = |index: usize| {
        let datum = sample.get(index).expect("partitioned index within sample bounds");
        loglikelihood_datum_raw(datum, track, multiplier)
    };

    let n_threads = track.n_threads().min(sample.len().max(1));
    let mut total = sum_over_data(sample.len(), n_threads, eval)?;

    if !track.normalize_weights() {
        total -= track.weights().iter().sum::<f64>();
    }
    Ok(total)
}

/// Natural log of the likelihood that one datum would be observed given the
/// track.
///
/// Applies the same weight normalization the sample entry point does, so a
/// datum evaluated alone and as a member of a sample sees identical
/// weights. The sample-level weight-sum subtraction does *not* apply here;
/// it belongs to the sample total.
///
/// Errors
/// ------
/// - [`LikelihoodError::ProjectionIncomplete`] when the track lacks a label
///   this datum measures.
/// - [`LikelihoodError::Singular`] for a covariance with a non-positive
///   determinant.
pub fn loglikelihood_datum(datum: &Datum, track: &Track) -> LikelihoodResult<f64> {
    loglikelihood_datum_raw(datum, track, weight_multiplier(track))
}

#[cfg(feature = "parallel")]
fn sum_over_data<F>(n_items: usize, n_threads: usize, eval: F) -> LikelihoodResult<f64>
where
    F: Fn(usize) -> LikelihoodResult<f64> + Sync,
{
    if n_threads > 1 {
        threading::partitioned_sum(n_items, n_threads, eval)
    } else {
        threading::serial_sum(n_items, eval)
    }
}

#[cfg(not(feature = "parallel"))]
fn sum_over_data<F>(n_items: usize, _n_threads: usize, eval: F) -> LikelihoodResult<f64>
where
    F: Fn(usize) -> LikelihoodResult<f64> + Sync,
{
    // Track::set_n_threads rejects counts above 1 in this configuration.
    threading::serial_sum(n_items, eval)
}

/// The scalar standing in for in-place weight normalization.
///
/// Multiplying each weight by this value is equivalent to the normalization
/// `w → w / W̄` described on [`WEIGHT_MAGNITUDE_SCALE`], without mutating
/// the track. A non-positive weight sum leaves the multiplier at 1; the
/// evaluation result is −∞ in that case regardless.
fn weight_multiplier(track: &Track) -> f64 {
    if !track.normalize_weights() {
        return 1.0;
    }
    let sum: f64 = track.weights().iter().sum();
    if sum <= 0.0 {
        return 1.0;
    }
    WEIGHT_MAGNITUDE_SCALE * track.n_vertices() as f64 / sum
}

/// Per-datum log-likelihood with the weight multiplier already resolved by
/// the caller. Both public entry points funnel through here, which is what
/// keeps sample evaluation from re-normalizing per datum.
fn loglikelihood_datum_raw(
    datum: &Datum,
    track: &Track,
    multiplier: f64,
) -> LikelihoodResult<f64> {
    let labels: Vec<&str> = datum.keys().iter().map(String::as_str).collect();
    let aligned = match track.project(&labels) {
        Ok(aligned) => aligned,
        Err(TrackError::Label(DataError::UnknownLabel { label })) => {
            return Err(LikelihoodError::ProjectionIncomplete { label });
        }
        Err(err) => panic!("internal inconsistency while aligning track to datum: {err}"),
    };

    let mut scratch = Scratch::new();
    let mut result = 0.0;
    for vertex in 0..aligned.n_vertices() {
        let chisq = chi_squared(datum, &aligned, vertex);
        let delta_m = delta_model(&aligned, vertex);
        let mut contribution =
            multiplier * aligned.weights()[vertex] * (-0.5 * chisq).exp() * delta_m;
        if aligned.use_line_segment_corrections() {
            contribution *= corrective_factor(datum, &aligned, vertex, &mut scratch);
        }
        result += contribution;
    }

    let det = datum.cov().determinant();
    if det <= 0.0 {
        return Err(LikelihoodError::Singular { determinant: det });
    }
    Ok((result / (2.0 * PI * det).sqrt()).ln())
}

/// χ² between the datum and one track vertex under the datum's inverse
/// covariance: `(d − t) · C⁻¹ · (d − t)ᵀ`.
///
/// Panics
/// ------
/// - On any kernel shape failure, or if the product does not reduce to a
///   1×1 matrix; both mean the projection upstream is broken.
fn chi_squared(datum: &Datum, track: &Track, vertex: usize) -> f64 {
    let point = trackpoint(track, vertex);
    let delta = expect_aligned(sub(datum, &point), "chi-squared difference");
    let delta_t = transpose(&delta);
    let first = expect_aligned(mul(&delta, datum.cov().inverse()), "chi-squared contraction");
    let second = expect_aligned(mul(&first, &delta_t), "chi-squared reduction");
    scalar(&second, "Chi-squared calculation")
}

/// Euclidean length of the segment leaving `vertex`; zero at the final
/// vertex, whose zero-length segment closes the track.
fn delta_model(track: &Track, vertex: usize) -> f64 {
    if vertex + 1 < track.n_vertices() {
        let predictions = track.predictions();
        let current = predictions.row(vertex);
        let next = predictions.row(vertex + 1);
        next.iter()
            .zip(current.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    } else {
        0.0
    }
}

/// The marginalization factor β for the segment leaving `vertex`.
///
/// With `L` the segment vector and `Δ` the datum's offset from the vertex,
/// `a = L·C⁻¹·Lᵀ` and `b = Δ·C⁻¹·Lᵀ` define
/// `β = ∫₀¹ exp(−½(aq² − 2bq)) dq`, evaluated numerically: the closed form
/// is the product of an extremely large and an extremely small number, and
/// quadrature is the stable route. The final vertex has no segment and
/// contributes zero.
fn corrective_factor(datum: &Datum, track: &Track, vertex: usize, scratch: &mut Scratch) -> f64 {
    if vertex + 1 >= track.n_vertices() {
        return 0.0;
    }

    let point = trackpoint(track, vertex);
    let next = trackpoint(track, vertex + 1);

    expect_aligned(
        sub_into(&next, &point, &mut scratch.segment),
        "line segment difference",
    );
    transpose_into(&scratch.segment, &mut scratch.segment_t);
    expect_aligned(
        mul_into(&scratch.segment, datum.cov().inverse(), &mut scratch.first),
        "line segment correction (a)",
    );
    expect_aligned(
        mul_into(&scratch.first, &scratch.segment_t, &mut scratch.second),
        "line segment correction (a)",
    );
    let a = scalar(&scratch.second, "Line segment correction (a)");

    expect_aligned(sub_into(datum, &point, &mut scratch.delta), "datum offset");
    expect_aligned(
        mul_into(&scratch.delta, datum.cov().inverse(), &mut scratch.first),
        "line segment correction (b)",
    );
    expect_aligned(
        mul_into(&scratch.first, &scratch.segment_t, &mut scratch.second),
        "line segment correction (b)",
    );
    let b = scalar(&scratch.second, "Line segment correction (b)");

    let integral = Integral {
        lower: 0.0,
        upper: 1.0,
        tolerance: LINE_SEGMENT_CORRECTION_TOLERANCE,
        n_min: LINE_SEGMENT_CORRECTION_MIN_BINS,
        n_max: LINE_SEGMENT_CORRECTION_MAX_BINS,
    };
    integral.evaluate(|q| (-0.5 * (a * q * q - 2.0 * b * q)).exp()).result
}

/// One vertex of the track as a standalone 1×dim row matrix.
fn trackpoint(track: &Track, vertex: usize) -> Matrix {
    let predictions = track.predictions();
    let mut point = Matrix::zeros(1, track.dim());
    for (j, &value) in predictions.row(vertex).iter().enumerate() {
        point[(0, j)] = value;
    }
    point
}

/// Scratch matrices for the per-segment contractions; resized on first use
/// and reused across vertices within one datum evaluation.
struct Scratch {
    segment: Matrix,
    segment_t: Matrix,
    delta: Matrix,
    first: Matrix,
    second: Matrix,
}

impl Scratch {
    fn new() -> Scratch {
        Scratch {
            segment: Matrix::zeros(1, 1),
            segment_t: Matrix::zeros(1, 1),
            delta: Matrix::zeros(1, 1),
            first: Matrix::zeros(1, 1),
            second: Matrix::zeros(1, 1),
        }
    }
}

fn expect_aligned<T>(result: crate::linalg::MatrixResult<T>, context: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("internal matrix inconsistency during {context}: {err}"),
    }
}

fn scalar(m: &Matrix, context: &str) -> f64 {
    if m.n_rows() == 1 && m.n_cols() == 1 {
        m[(0, 0)]
    } else {
        panic!("{context} resulted in a matrix larger than 1x1.");
    }
}
