//! Collective transport abstraction.
//!
//! The selection algorithm communicates exclusively through the handful of
//! collective primitives defined here, so the message-passing runtime is an
//! injected dependency. [`local::LocalGroup`] simulates a process group over
//! threads within one address space; the `mpi` cargo feature adds a thin
//! binding to a real MPI communicator.
//!
//! Every primitive is a synchronization point. All members of a group must
//! call the same sequence of collectives with compatible arguments;
//! divergent call sequences are a protocol violation and either deadlock or
//! surface as [`TransportError::CollectiveMismatch`].

pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi;

use thiserror::Error;

/// Rank of the distinguished process that receives gathers and originates
/// broadcasts.
pub const ROOT: usize = 0;

/// Failure reasons from the collective transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A peer process failed while a collective was in flight.
    #[error("a peer process failed during a collective operation")]
    PeerFailed,

    /// The processes of a group called different collectives, or the same
    /// collective with incompatible shapes.
    #[error("collective call sequence diverged across processes")]
    CollectiveMismatch,

    /// The root called a variable-count gather without supplying the counts
    /// it gathered beforehand.
    #[error("root rank called a varcount gather without the gathered counts")]
    MissingCounts,
}

/// Collective operations over a fixed group of processes.
///
/// Implementations must guarantee that a value reduced or broadcast through
/// any of these methods is bit-identical on every member of the group.
pub trait Collective {
    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// This process's 0-based rank within the group.
    fn rank(&self) -> usize;

    /// Element-wise sum reduction of an `i64` vector, result on every
    /// process. A scalar reduction is a length-1 slice.
    fn allreduce_sum_i64(&self, values: &[i64]) -> Result<Vec<i64>, TransportError>;

    /// Gather one `i32` from every process onto the root, in rank order.
    /// Returns `Some` on the root and `None` everywhere else.
    fn gather_i32(&self, value: i32) -> Result<Option<Vec<i32>>, TransportError>;

    /// Variable-length gather of `f64` values onto the root, concatenated in
    /// rank order. The root passes the per-rank counts it obtained from a
    /// preceding [`gather_i32`](Collective::gather_i32); other ranks pass
    /// `None`. Returns `Some` on the root and `None` everywhere else, so
    /// non-root processes allocate nothing.
    fn gatherv_f64(
        &self,
        values: &[f64],
        counts: Option<&[i32]>,
    ) -> Result<Option<Vec<f64>>, TransportError>;

    /// Broadcast one `f64` from the root to every process. The root passes
    /// the value to distribute; the argument of other ranks is ignored and
    /// every process returns the root's value.
    fn broadcast_f64(&self, value: f64) -> Result<f64, TransportError>;

    /// Whether this process is the root of the group.
    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }
}
