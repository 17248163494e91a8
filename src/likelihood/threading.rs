//! Thread-partitioned summation for sample likelihoods.
//!
//! Purpose
//! -------
//! Split the index range `[0, n_items)` into contiguous, balanced subranges,
//! evaluate each on its own worker, and reduce the per-range partial sums in
//! index order on the calling thread. Reducing in index order keeps results
//! bit-reproducible across runs with the same thread count.
//!
//! The machine-wide thread cap lives here as well; track configuration
//! consults it when a thread count is requested.
use crate::likelihood::errors::LikelihoodResult;
use std::ops::Range;

#[cfg(feature = "parallel")]
use crate::likelihood::errors::LikelihoodError;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Upper bound on worker threads, per CPU.
///
/// Oversubscription beyond this ratio only adds scheduling overhead to what
/// is straight-line CPU work; requests above `MAX_THREADS_PER_CPU ×
/// cpu_count` are clamped down and recorded.
pub const MAX_THREADS_PER_CPU: usize = 10;

/// The machine-wide worker-thread cap: [`MAX_THREADS_PER_CPU`] times the
/// number of logical CPUs.
pub fn max_threads_allowed() -> usize {
    MAX_THREADS_PER_CPU * num_cpus::get()
}

/// Contiguous, balanced partition of `[0, n_items)` into `n_chunks` ranges.
///
/// The first `n_items % n_chunks` ranges carry one extra item. Ranges may be
/// empty when there are more chunks than items.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
fn partition(n_items: usize, n_chunks: usize) -> Vec<Range<usize>> {
    let base = n_items / n_chunks;
    let remainder = n_items % n_chunks;
    let mut ranges = Vec::with_capacity(n_chunks);
    let mut start = 0;
    for chunk in 0..n_chunks {
        let len = base + usize::from(chunk < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Sum `eval(index)` over `[0, n_items)` on `n_threads` workers.
///
/// Each worker accumulates one contiguous subrange serially; the partials
/// are reduced in index order by the caller's thread. The first error
/// encountered (in index order) is returned.
///
/// Errors
/// ------
/// - [`LikelihoodError::ThreadPool`] when the pool cannot be built.
/// - Whatever `eval` reports.
#[cfg(feature = "parallel")]
pub(crate) fn partitioned_sum<F>(
    n_items: usize,
    n_threads: usize,
    eval: F,
) -> LikelihoodResult<f64>
where
    F: Fn(usize) -> LikelihoodResult<f64> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build()
        .map_err(|err| LikelihoodError::ThreadPool { reason: err.to_string() })?;

    let partials: Vec<LikelihoodResult<f64>> = pool.install(|| {
        partition(n_items, n_threads)
            .into_par_iter()
            .map(|range| {
                let mut acc = 0.0;
                for index in range {
                    acc += eval(index)?;
                }
                Ok(acc)
            })
            .collect()
    });

    let mut total = 0.0;
    for partial in partials {
        total += partial?;
    }
    Ok(total)
}

/// Serial fallback with the same contract as the parallel form.
pub(crate) fn serial_sum<F>(n_items: usize, eval: F) -> LikelihoodResult<f64>
where
    F: Fn(usize) -> LikelihoodResult<f64>,
{
    let mut total = 0.0;
    for index in 0..n_items {
        total += eval(index)?;
    }
    Ok(total)
}
