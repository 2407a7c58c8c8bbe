//! Error types for distributed selection.

use thiserror::Error;

use crate::transport::TransportError;

/// Failure reasons from the selection entry points.
///
/// Every variant is derived from globally-reduced values, so all processes
/// in the group observe the same error on the same call.
#[derive(Debug, Error)]
pub enum SelectError {
    /// The requested quantile lies outside `[0, 1]` (or is NaN).
    #[error("quantile must lie in [0, 1], got {0}")]
    InvalidQuantile(f64),

    /// The declared global size is zero or negative.
    #[error("total size must be at least 1, got {0}")]
    EmptyInput(i64),

    /// The declared global size disagrees with the reduced sum of local sizes.
    #[error("declared total size {declared} does not match the global element count {actual}")]
    SizeMismatch {
        /// Size the caller declared.
        declared: i64,
        /// Size obtained by summing local slice lengths across processes.
        actual: i64,
    },

    /// NaN values were found in the global input. NaN compares false against
    /// everything, which would silently break the bucket counts.
    #[error("{count} NaN value(s) present in the global input")]
    NanInput {
        /// Global NaN count.
        count: i64,
    },

    /// The target rank is not a valid 0-based index into the global multiset.
    #[error("target rank {rank} is outside the global size {total}")]
    RankOutOfRange {
        /// Requested 0-based rank.
        rank: i64,
        /// Current global element count.
        total: i64,
    },

    /// The three bucket counts failed to cover the global size. Indicates
    /// logic or data corruption; not recoverable.
    #[error("bucket counts {below} + {within} + {above} do not sum to the global size {total}")]
    CountInvariant {
        /// Elements below the lower pivot.
        below: i64,
        /// Elements in the half-open pivot interval.
        within: i64,
        /// Elements at or above the upper pivot.
        above: i64,
        /// Expected global size.
        total: i64,
    },

    /// The underlying collective transport failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
