//! In-memory process group over threads.
//!
//! `LocalGroup` simulates a message-passing group inside one address space:
//! each simulated process owns a [`LocalCollective`] handle and runs on its
//! own thread. Collectives rendezvous on a shared slot board guarded by a
//! barrier, so the lockstep semantics match a real runtime: every member
//! must reach every collective, in the same order.
//!
//! This is the transport the test suite runs on, and it is also usable for
//! single-machine callers that want the algorithm without an MPI
//! installation.

use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use super::{Collective, TransportError, ROOT};

/// One contribution on the slot board.
enum Message {
    Reduce(Vec<i64>),
    Count(i32),
    Values(Vec<f64>),
    Scalar(f64),
}

struct Shared {
    size: usize,
    barrier: Barrier,
    slots: Mutex<Vec<Option<Message>>>,
}

/// Factory for in-memory process groups.
pub struct LocalGroup;

impl LocalGroup {
    /// Create a group of `size` members and hand out one collective handle
    /// per rank, in rank order.
    ///
    /// Every handle must participate in every collective; dropping one while
    /// the others keep communicating deadlocks the group, exactly as a lost
    /// process would.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn create(size: usize) -> Vec<LocalCollective> {
        assert!(size > 0, "A process group needs at least one member");
        let shared = Arc::new(Shared {
            size,
            barrier: Barrier::new(size),
            slots: Mutex::new((0..size).map(|_| None).collect()),
        });
        (0..size)
            .map(|rank| LocalCollective {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect()
    }

    /// Run `f` once per rank on its own thread and collect the results in
    /// rank order. This is the harness used throughout the test suite.
    ///
    /// # Panics
    ///
    /// Panics if any worker thread panics.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        F: Fn(LocalCollective) -> R + Sync,
        R: Send,
    {
        let handles = Self::create(size);
        thread::scope(|scope| {
            let workers: Vec<_> = handles
                .into_iter()
                .map(|comm| {
                    let f = &f;
                    scope.spawn(move || f(comm))
                })
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join().expect("Group member thread panicked"))
                .collect()
        })
    }
}

/// Collective handle for one simulated process.
pub struct LocalCollective {
    rank: usize,
    shared: Arc<Shared>,
}

impl LocalCollective {
    /// Deposit this rank's contribution, wait for the group, and read the
    /// result off the full board. The trailing barrier keeps a fast member
    /// from starting the next collective before everyone has read this one.
    fn exchange<T>(
        &self,
        message: Message,
        read: impl FnOnce(&[Option<Message>]) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        {
            let mut slots = self
                .shared
                .slots
                .lock()
                .map_err(|_| TransportError::PeerFailed)?;
            slots[self.rank] = Some(message);
        }
        self.shared.barrier.wait();
        let result = {
            let slots = self
                .shared
                .slots
                .lock()
                .map_err(|_| TransportError::PeerFailed)?;
            read(&slots)
        };
        self.shared.barrier.wait();
        result
    }
}

impl Collective for LocalCollective {
    fn size(&self) -> usize {
        self.shared.size
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn allreduce_sum_i64(&self, values: &[i64]) -> Result<Vec<i64>, TransportError> {
        let width = values.len();
        self.exchange(Message::Reduce(values.to_vec()), |slots| {
            let mut sums = vec![0i64; width];
            for slot in slots {
                match slot {
                    Some(Message::Reduce(contribution)) if contribution.len() == width => {
                        for (sum, value) in sums.iter_mut().zip(contribution) {
                            *sum += value;
                        }
                    }
                    _ => return Err(TransportError::CollectiveMismatch),
                }
            }
            Ok(sums)
        })
    }

    fn gather_i32(&self, value: i32) -> Result<Option<Vec<i32>>, TransportError> {
        let rank = self.rank;
        self.exchange(Message::Count(value), move |slots| {
            if rank != ROOT {
                return Ok(None);
            }
            let mut gathered = Vec::with_capacity(slots.len());
            for slot in slots {
                match slot {
                    Some(Message::Count(value)) => gathered.push(*value),
                    _ => return Err(TransportError::CollectiveMismatch),
                }
            }
            Ok(Some(gathered))
        })
    }

    fn gatherv_f64(
        &self,
        values: &[f64],
        counts: Option<&[i32]>,
    ) -> Result<Option<Vec<f64>>, TransportError> {
        let rank = self.rank;
        if rank == ROOT && counts.is_none() {
            return Err(TransportError::MissingCounts);
        }
        let capacity = counts
            .map(|counts| counts.iter().map(|&count| count as usize).sum())
            .unwrap_or(0);
        self.exchange(Message::Values(values.to_vec()), move |slots| {
            if rank != ROOT {
                return Ok(None);
            }
            let mut gathered = Vec::with_capacity(capacity);
            for slot in slots {
                match slot {
                    Some(Message::Values(contribution)) => {
                        gathered.extend_from_slice(contribution)
                    }
                    _ => return Err(TransportError::CollectiveMismatch),
                }
            }
            Ok(Some(gathered))
        })
    }

    fn broadcast_f64(&self, value: f64) -> Result<f64, TransportError> {
        self.exchange(Message::Scalar(value), |slots| match &slots[ROOT] {
            Some(Message::Scalar(value)) => Ok(*value),
            _ => Err(TransportError::CollectiveMismatch),
        })
    }
}
