//! The data model: labeled measurement vectors, their covariance matrices,
//! and heterogeneous samples.
//!
//! A [`Datum`] couples a row vector with per-component labels and a
//! [`CovarianceMatrix`] whose cached inverse feeds the χ² kernel. A
//! [`Sample`] collects data whose label sets may differ, exposing the union
//! as its observable set and reading absent labels as `NaN` (shadow labels).
//! Label handling, including the `err_*` / `*_err` uncertainty-key
//! convention, lives in [`labels`].

pub mod covariance;
pub mod datum;
pub mod errors;
pub mod labels;
pub mod sample;

pub use covariance::{CovarianceMatrix, MIN_COVARIANCE_DIAGONAL};
pub use datum::Datum;
pub use errors::{DataError, DataResult};
pub use labels::MAX_LABEL_LEN;
pub use sample::{Relation, Sample};
