//! Label validation and the uncertainty-key naming convention.
//!
//! Labels address columns everywhere in the data model: datum components,
//! covariance axes, track predictions, and sample observables. A label is a
//! nonempty ASCII string of at most [`MAX_LABEL_LEN`] bytes, unique within
//! its owner.
//!
//! Uncertainty keys follow the measurement convention: a key beginning with
//! `err_` or ending with `_err` carries the 1-σ uncertainty of the base
//! quantity named by the remainder of the string. `err_age` and `age_err`
//! both refer to the uncertainty of `age`.
use crate::data::errors::{DataError, DataResult};

/// Maximum number of bytes in a label.
///
/// Labels travel through every lookup on the hot path; bounding their length
/// keeps comparisons cheap and diagnostics readable. Raising the limit is a
/// recompile, not an API change.
pub const MAX_LABEL_LEN: usize = 100;

/// Check that a label is nonempty, ASCII, and within [`MAX_LABEL_LEN`].
///
/// Errors
/// ------
/// - [`DataError::EmptyLabel`] for the empty string.
/// - [`DataError::NonAscii`] when any byte is outside ASCII.
/// - [`DataError::LabelTooLong`] when the label exceeds the limit.
pub fn validate_label(label: &str) -> DataResult<()> {
    if label.is_empty() {
        return Err(DataError::EmptyLabel);
    }
    if !label.is_ascii() {
        return Err(DataError::NonAscii { label: label.to_string() });
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(DataError::LabelTooLong { label: label.to_string(), limit: MAX_LABEL_LEN });
    }
    Ok(())
}

/// The base quantity an uncertainty key refers to, if the key is one.
///
/// Checks the `err_` prefix first, then the `_err` suffix; a bare `err_` or
/// `_err` with an empty remainder is an ordinary label, not an uncertainty
/// key.
pub fn uncertainty_base(label: &str) -> Option<&str> {
    if let Some(base) = label.strip_prefix("err_") {
        if !base.is_empty() {
            return Some(base);
        }
    }
    if let Some(base) = label.strip_suffix("_err") {
        if !base.is_empty() {
            return Some(base);
        }
    }
    None
}

/// Position of `label` within `labels`, or `None`.
pub(crate) fn label_index(labels: &[String], label: &str) -> Option<usize> {
    labels.iter().position(|candidate| candidate == label)
}
