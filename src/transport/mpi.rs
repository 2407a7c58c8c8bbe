//! MPI-backed collective transport.
//!
//! Thin wrapper mapping the [`Collective`] trait onto an MPI communicator
//! through the `mpi` crate. Enabled with the `mpi` cargo feature; requires a
//! working MPI installation at build and run time.

use mpi::collective::SystemOperation;
use mpi::datatype::PartitionMut;
use mpi::topology::SimpleCommunicator;
use mpi::traits::{Communicator, CommunicatorCollectives, Root};

use super::{Collective, TransportError, ROOT};

/// Collective handle backed by an MPI communicator.
///
/// The underlying MPI library aborts the job on communication failure (the
/// default MPI error handler), so the `Result`s returned here only carry
/// protocol errors raised on this side of the binding.
pub struct MpiCollective {
    world: SimpleCommunicator,
}

impl MpiCollective {
    /// Wrap an MPI communicator, typically `universe.world()`.
    pub fn new(world: SimpleCommunicator) -> Self {
        Self { world }
    }
}

impl Collective for MpiCollective {
    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn allreduce_sum_i64(&self, values: &[i64]) -> Result<Vec<i64>, TransportError> {
        let mut sums = vec![0i64; values.len()];
        self.world
            .all_reduce_into(values, &mut sums[..], SystemOperation::sum());
        Ok(sums)
    }

    fn gather_i32(&self, value: i32) -> Result<Option<Vec<i32>>, TransportError> {
        let root = self.world.process_at_rank(ROOT as i32);
        if self.is_root() {
            let mut gathered = vec![0i32; self.size()];
            root.gather_into_root(&value, &mut gathered[..]);
            Ok(Some(gathered))
        } else {
            root.gather_into(&value);
            Ok(None)
        }
    }

    fn gatherv_f64(
        &self,
        values: &[f64],
        counts: Option<&[i32]>,
    ) -> Result<Option<Vec<f64>>, TransportError> {
        let root = self.world.process_at_rank(ROOT as i32);
        if self.is_root() {
            let counts = counts.ok_or(TransportError::MissingCounts)?;
            let displacements: Vec<i32> = counts
                .iter()
                .scan(0i32, |offset, &count| {
                    let current = *offset;
                    *offset += count;
                    Some(current)
                })
                .collect();
            let total: i32 = counts.iter().sum();
            let mut gathered = vec![0f64; total as usize];
            {
                let mut partition = PartitionMut::new(&mut gathered[..], counts, &displacements[..]);
                root.gather_varcount_into_root(values, &mut partition);
            }
            Ok(Some(gathered))
        } else {
            root.gather_varcount_into(values);
            Ok(None)
        }
    }

    fn broadcast_f64(&self, value: f64) -> Result<f64, TransportError> {
        let mut value = value;
        self.world
            .process_at_rank(ROOT as i32)
            .broadcast_into(&mut value);
        Ok(value)
    }
}
