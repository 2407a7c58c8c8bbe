//! Local n-th element selection on a single buffer.
//!
//! Uses `slice.select_nth_unstable_by()`, which implements introselect with
//! O(n) average time. The buffer is partially reordered as a side effect;
//! callers that select twice from the same buffer get correct results both
//! times because the multiset of values is unchanged.

use std::cmp::Ordering;

/// Place the element of 0-based rank `k` at index `k` and return it.
///
/// # Arguments
///
/// * `data` - Mutable buffer of values (will be partially reordered)
/// * `k` - 0-based rank to select
///
/// # Panics
///
/// Panics if `data` is empty or if `k` is out of bounds.
pub fn select_nth(data: &mut [f64], k: usize) -> f64 {
    assert!(!data.is_empty(), "Cannot select from an empty slice");
    assert!(
        k < data.len(),
        "Selection rank {} out of bounds for {} elements",
        k,
        data.len()
    );

    if data.len() == 1 {
        return data[0];
    }

    let (_, &mut value, _) =
        data.select_nth_unstable_by(k, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    value
}
