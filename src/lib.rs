//! rust_trackfit — log-likelihoods for fitting weighted curves to
//! multivariate data.
//!
//! Purpose
//! -------
//! Compute the natural log of the likelihood that a set of measured data
//! vectors in an N-dimensional observable space was drawn from a model
//! whose central prediction is an infinitely thin, density-weighted curve
//! (a "track") through that same space. The likelihood accommodates full
//! multivariate Gaussian measurement uncertainties (an arbitrary covariance
//! matrix per datum), heterogeneous samples in which different data expose
//! different subsets of the measured quantities, density-weighted sampling
//! along the track, and an optional correction for the finite length of the
//! straight segments approximating the curve.
//!
//! Key behaviors
//! -------------
//! - [`data::Datum`] couples a labeled measurement vector with a
//!   [`data::CovarianceMatrix`] whose inverse is cached and kept fresh
//!   across assignments; [`data::Sample`] collects data with possibly
//!   differing label sets and reads absent labels as `NaN`.
//! - [`track::Track`] holds the model's predicted vertices, per-vertex
//!   density weights, and the evaluation flags.
//! - [`likelihood::loglikelihood_datum`] and
//!   [`likelihood::loglikelihood_sample`] score data against a track,
//!   projecting the track onto each datum's labels and summing per-vertex
//!   χ² contributions; sample sums are thread-partitioned when the
//!   `parallel` feature (default) is enabled.
//! - [`linalg`] is the dense matrix kernel underneath, and [`quadrature`]
//!   the adaptive Simpson integrator behind line-segment corrections.
//!
//! Conventions
//! -----------
//! - Columns are addressed by ASCII labels; `err_<key>` / `<key>_err`
//!   supplies the 1-σ uncertainty of `<key>` at construction time.
//! - Errors arise at the edges (construction, assignment, projection) and
//!   propagate unchanged; a kernel inconsistency discovered mid-evaluation
//!   is a bug and aborts with a diagnostic.
//! - Likelihoods are plain `f64` values; −∞ signals a degenerate
//!   (zero-product) evaluation, not an error.
//!
//! Downstream usage
//! ----------------
//! - Optimizers and samplers sit on top of the returned log-likelihoods;
//!   nothing in this crate mutates a track or sample during evaluation, so
//!   both can be reused across iterations and threads.
//! - Language bindings, array-like input coercion, and textual rendering
//!   are deliberately external concerns: the core takes numeric inputs and
//!   returns numeric outputs.

pub mod data;
pub mod likelihood;
pub mod linalg;
pub mod quadrature;
pub mod track;

pub use data::{CovarianceMatrix, DataError, DataResult, Datum, Relation, Sample};
pub use likelihood::{
    loglikelihood_datum, loglikelihood_sample, LikelihoodError, LikelihoodResult,
};
pub use linalg::{Matrix, MatrixError, MatrixResult, MatrixView};
pub use quadrature::{Integral, IntegralResult};
pub use track::errors::{TrackError, TrackResult};
pub use track::Track;
