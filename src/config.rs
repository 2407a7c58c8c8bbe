//! Configuration for distributed selection.

use serde::{Deserialize, Serialize};

/// Configuration options for `QuantileSelector`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Global size below which the data is gathered to the root and selected
    /// in place instead of recursing (default: 10,000,000).
    pub gather_threshold: i64,

    /// Global sample budget per pivot draw, split evenly across processes
    /// (default: 100,000).
    pub sample_total: i64,

    /// How many times a recursion level redraws its sample after a pivot
    /// pair fails to make progress, before falling back to the gathered
    /// path (default: 3).
    pub max_pivot_retries: u32,

    /// Optional base seed for the per-process sample generators. Each
    /// process mixes its rank into this value, so ranks draw independent
    /// sequences. `None` uses a fixed base, making runs reproducible for a
    /// given data distribution.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gather_threshold: 10_000_000,
            sample_total: 100_000,
            max_pivot_retries: 3,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gather_threshold, 10_000_000);
        assert_eq!(config.sample_total, 100_000);
        assert_eq!(config.max_pivot_retries, 3);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = Config {
            gather_threshold: 1_000,
            sample_total: 64,
            max_pivot_retries: 5,
            seed: Some(7),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gather_threshold, 1_000);
        assert_eq!(back.sample_total, 64);
        assert_eq!(back.max_pivot_retries, 5);
        assert_eq!(back.seed, Some(7));
    }
}
