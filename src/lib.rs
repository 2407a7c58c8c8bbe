//! # ranksel
//!
//! Distributed order-statistic and quantile selection for `f64` data
//! partitioned across the processes of a message-passing group.
//!
//! Given a quantile `q ∈ [0, 1]` over a global multiset of `N` values, the
//! crate returns the element of 0-based rank `⌊q·N⌋` on every process. Small
//! inputs are gathered to a root process and selected in place; large inputs
//! are narrowed level by level with random sampling and three-way pivot
//! partitioning, so no process ever has to materialize the global array.
//!
//! The algorithm is correct for any distribution of data across processes,
//! including ranks that hold nothing, and for arbitrarily duplicated values.
//!
//! ## Quick Start
//!
//! ```
//! use ranksel::{quantile, Collective, LocalGroup};
//!
//! // Four simulated processes, one value each.
//! let results = LocalGroup::run(4, |comm| {
//!     let local = vec![(comm.rank() + 1) as f64];
//!     quantile(&comm, &local, 4, 0.99).unwrap()
//! });
//! assert_eq!(results, vec![4.0; 4]);
//! ```
//!
//! ## Collective discipline
//!
//! Every entry point is a collective operation: all processes of the group
//! must call it together, with the same `total_size` and `q`, and the
//! returned value is bit-identical everywhere. The message-passing runtime
//! is injected through the [`Collective`] trait; [`LocalGroup`] provides an
//! in-memory group over threads, and the `mpi` cargo feature adds a binding
//! to a real MPI communicator.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod nth;
mod partition;
mod sampling;
mod selector;
pub mod transport;
mod types;

pub use config::Config;
pub use error::SelectError;
pub use selector::QuantileSelector;
pub use transport::local::{LocalCollective, LocalGroup};
pub use transport::{Collective, TransportError};
pub use types::{Bucket, BucketCounts, PivotPair};

#[cfg(feature = "mpi")]
pub use transport::mpi::MpiCollective;

/// Convenience function computing a quantile with default configuration.
///
/// Equivalent to `QuantileSelector::new().quantile(comm, local, total_size, q)`.
/// See [`QuantileSelector::quantile`] for the full contract.
pub fn quantile<C: Collective>(
    comm: &C,
    local: &[f64],
    total_size: i64,
    q: f64,
) -> Result<f64, SelectError> {
    QuantileSelector::new().quantile(comm, local, total_size, q)
}

/// Convenience function computing the median with default configuration.
pub fn median<C: Collective>(
    comm: &C,
    local: &[f64],
    total_size: i64,
) -> Result<f64, SelectError> {
    QuantileSelector::new().median(comm, local, total_size)
}
