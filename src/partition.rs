//! Three-way partitioning against a pivot pair.
//!
//! Partitioning runs in two passes: one counting scan, and one copy scan
//! once the surviving bucket is known. This avoids allocating three buffers
//! when only one of them is kept.

use crate::types::{Bucket, BucketCounts, PivotPair};

/// Whether `value` falls into `bucket` under the given pivots.
fn matches(bucket: Bucket, pivots: PivotPair, value: f64) -> bool {
    match bucket {
        Bucket::Below => value < pivots.lo,
        Bucket::Within => value >= pivots.lo && value < pivots.hi,
        Bucket::Above => value >= pivots.hi,
    }
}

/// Count how many local elements fall into each of the three buckets.
///
/// NaN values match none of the predicates and would make the counts fall
/// short of the slice length; the entry point rejects them up front.
pub fn count_buckets(data: &[f64], pivots: PivotPair) -> BucketCounts {
    let mut counts = BucketCounts {
        below: 0,
        within: 0,
        above: 0,
    };
    for &value in data {
        if value < pivots.lo {
            counts.below += 1;
        } else if value < pivots.hi {
            counts.within += 1;
        } else {
            counts.above += 1;
        }
    }
    counts
}

/// Copy the local elements of one bucket into a fresh buffer.
///
/// `len` is the local bucket size from a prior [`count_buckets`] pass, used
/// to size the allocation exactly.
pub fn take_bucket(data: &[f64], pivots: PivotPair, bucket: Bucket, len: usize) -> Vec<f64> {
    let mut kept = Vec::with_capacity(len);
    for &value in data {
        if matches(bucket, pivots, value) {
            kept.push(value);
        }
    }
    kept
}
