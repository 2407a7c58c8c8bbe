//! Selection driver and public entry points.

use log::{debug, warn};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::Config;
use crate::error::SelectError;
use crate::nth;
use crate::partition;
use crate::sampling;
use crate::transport::Collective;
use crate::types::{Bucket, BucketCounts, PivotPair};

/// Outcome of the pivot rounds at one recursion level.
enum Step {
    /// The upper pivot is the answer (duplicate run crossing the target).
    Done(f64),
    /// Repeated pivot failures; gather everything to the root instead.
    Fallback,
    /// Keep one bucket and continue with an adjusted rank.
    Narrowed {
        pivots: PivotPair,
        bucket: Bucket,
        rank: i64,
        local_len: usize,
    },
}

/// Distributed quantile and order-statistic selection.
///
/// Configure with the builder methods, then call
/// [`quantile`](QuantileSelector::quantile) collectively on every process of
/// the group.
///
/// # Example
///
/// ```
/// use ranksel::{Collective, LocalGroup, QuantileSelector};
///
/// let medians = LocalGroup::run(2, |comm| {
///     let local: Vec<f64> = if comm.rank() == 0 {
///         vec![1.0, 2.0, 3.0]
///     } else {
///         vec![4.0, 5.0]
///     };
///     QuantileSelector::new()
///         .quantile(&comm, &local, 5, 0.5)
///         .unwrap()
/// });
/// assert_eq!(medians, vec![3.0, 3.0]);
/// ```
#[derive(Debug, Clone)]
pub struct QuantileSelector {
    config: Config,
}

impl Default for QuantileSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantileSelector {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Create from an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the global size below which data is gathered to the root and
    /// selected directly.
    pub fn gather_threshold(mut self, size: i64) -> Self {
        self.config.gather_threshold = size;
        self
    }

    /// Set the global sample budget per pivot draw.
    pub fn sample_total(mut self, size: i64) -> Self {
        self.config.sample_total = size;
        self
    }

    /// Set how many fresh samples a recursion level may draw after a failed
    /// pivot before falling back to the gathered path.
    pub fn max_pivot_retries(mut self, retries: u32) -> Self {
        self.config.max_pivot_retries = retries;
        self
    }

    /// Set the base seed for the per-process sample generators.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compute the quantile `q` of the globally distributed multiset.
    ///
    /// Must be called collectively by every process of the group with the
    /// same `total_size` and `q`. Returns on every process the value `v`,
    /// present in the global multiset, whose 0-based rank is `⌊q·N⌋`; at
    /// most `⌊q·N⌋` elements compare strictly below `v`. With duplicate
    /// runs crossing the target rank, `v` is the duplicated value.
    ///
    /// `q = 1` is clamped to rank `N − 1` and returns the maximum.
    ///
    /// The caller's buffer is not mutated; the algorithm works on an
    /// internal copy. `local` may be empty on any subset of processes.
    pub fn quantile<C: Collective>(
        &self,
        comm: &C,
        local: &[f64],
        total_size: i64,
        q: f64,
    ) -> Result<f64, SelectError> {
        if !(0.0..=1.0).contains(&q) {
            return Err(SelectError::InvalidQuantile(q));
        }
        if total_size < 1 {
            return Err(SelectError::EmptyInput(total_size));
        }

        // One fused reduction validates both preconditions, so every rank
        // takes the same error path even when only one rank holds bad data.
        let nan_count = local.iter().filter(|value| value.is_nan()).count() as i64;
        let reduced = comm.allreduce_sum_i64(&[local.len() as i64, nan_count])?;
        if reduced[0] != total_size {
            return Err(SelectError::SizeMismatch {
                declared: total_size,
                actual: reduced[0],
            });
        }
        if reduced[1] > 0 {
            return Err(SelectError::NanInput { count: reduced[1] });
        }

        let k = ((q * total_size as f64) as i64).min(total_size - 1);
        self.select_nth(comm, local, k)
    }

    /// Compute the median, the quantile at `q = 0.5`.
    pub fn median<C: Collective>(
        &self,
        comm: &C,
        local: &[f64],
        total_size: i64,
    ) -> Result<f64, SelectError> {
        self.quantile(comm, local, total_size, 0.5)
    }

    /// Select the element of global 0-based rank `k`.
    ///
    /// Collective; uses a per-process sample generator seeded from the
    /// configured base seed and the process rank.
    pub fn select_nth<C: Collective>(
        &self,
        comm: &C,
        local: &[f64],
        k: i64,
    ) -> Result<f64, SelectError> {
        let base = self.config.seed.unwrap_or(0);
        let mut rng =
            Xoshiro256PlusPlus::seed_from_u64(sampling::mix_seed(base, comm.rank() as u64));
        self.select_nth_with_rng(comm, local, k, &mut rng)
    }

    /// Select the element of global 0-based rank `k` using a caller-provided
    /// sample generator.
    ///
    /// The generator only influences which pivots are tried, never the
    /// result. Exposed so callers can control reproducibility directly.
    pub fn select_nth_with_rng<C: Collective, R: Rng>(
        &self,
        comm: &C,
        local: &[f64],
        k: i64,
        rng: &mut R,
    ) -> Result<f64, SelectError> {
        let mut data = local.to_vec();
        let mut k = k;

        loop {
            let total = comm.allreduce_sum_i64(&[data.len() as i64])?[0];
            if k < 0 || k >= total {
                return Err(SelectError::RankOutOfRange { rank: k, total });
            }
            debug!(
                "selecting rank {} of {} elements across {} processes",
                k,
                total,
                comm.size()
            );

            if total < self.config.gather_threshold {
                return gather_select(comm, &data, k);
            }

            match self.narrow(comm, &data, total, k, rng)? {
                Step::Done(value) => return Ok(value),
                Step::Fallback => return gather_select(comm, &data, k),
                Step::Narrowed {
                    pivots,
                    bucket,
                    rank,
                    local_len,
                } => {
                    data = partition::take_bucket(&data, pivots, bucket, local_len);
                    k = rank;
                }
            }
        }
    }

    /// Run pivot rounds at one recursion level until a pair makes progress,
    /// the upper pivot resolves the query, or the retry budget runs out.
    ///
    /// All decisions here derive from globally-reduced counts, so every
    /// process takes the same branch.
    fn narrow<C: Collective, R: Rng>(
        &self,
        comm: &C,
        data: &[f64],
        total: i64,
        k: i64,
        rng: &mut R,
    ) -> Result<Step, SelectError> {
        let attempts = self.config.max_pivot_retries + 1;
        for attempt in 1..=attempts {
            let pivots =
                sampling::sample_pivots(comm, data, total, k, self.config.sample_total, rng)?;
            let local = partition::count_buckets(data, pivots);
            let reduced = comm.allreduce_sum_i64(&[local.below, local.within, local.above])?;
            let global = BucketCounts {
                below: reduced[0],
                within: reduced[1],
                above: reduced[2],
            };
            if global.total() != total {
                return Err(SelectError::CountInvariant {
                    below: global.below,
                    within: global.within,
                    above: global.above,
                    total,
                });
            }
            debug!(
                "bucket counts: {} below, {} within, {} above",
                global.below, global.within, global.above
            );

            // More elements at or above hi than from rank k onward means
            // elements below hi stop before rank k. hi is then the answer
            // iff its duplicate run extends to rank k, i.e. fewer than
            // N - k elements lie strictly above it. Without that second
            // check a clamped upper sample rank would short-circuit queries
            // near k = N - 1 on distinct data.
            if global.above > total - k {
                let strictly_above =
                    data.iter().filter(|&&value| value > pivots.hi).count() as i64;
                let run_covers_k =
                    comm.allreduce_sum_i64(&[strictly_above])?[0] <= total - k - 1;
                if run_covers_k {
                    return Ok(Step::Done(pivots.hi));
                }
            }

            let (bucket, rank) = global.locate(k);

            // A pivot pair fails when the lower pivot overshoots the target
            // (the first bucket would have to contain it) or the chosen
            // bucket is the whole input (no progress).
            if global.below > k || global.get(bucket) == total {
                warn!(
                    "pivot pair ({}, {}) made no progress at size {} (attempt {}/{})",
                    pivots.lo, pivots.hi, total, attempt, attempts
                );
                continue;
            }

            return Ok(Step::Narrowed {
                pivots,
                bucket,
                rank,
                local_len: local.get(bucket) as usize,
            });
        }

        warn!(
            "falling back to gathered selection at size {} after {} failed pivot draws",
            total, attempts
        );
        Ok(Step::Fallback)
    }
}

/// Gather every slice to the root, select locally, and broadcast the result.
///
/// Non-root processes never allocate the gather buffer.
fn gather_select<C: Collective>(comm: &C, data: &[f64], k: i64) -> Result<f64, SelectError> {
    let counts = comm.gather_i32(data.len() as i32)?;
    let gathered = comm.gatherv_f64(data, counts.as_deref())?;
    let value = match gathered {
        Some(mut pool) => nth::select_nth(&mut pool, k as usize),
        None => 0.0,
    };
    Ok(comm.broadcast_f64(value)?)
}
