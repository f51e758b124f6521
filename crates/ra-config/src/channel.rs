//! Per-allocation-channel CRDSA configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Static CRDSA parameters of one allocation channel.
///
/// Slot indices are frame-relative.  All time-like quantities are in blocks
/// (one block = one scheduler evaluation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationChannelConfig {
    /// Probability in `[0, 1)` that a free channel backs off this block.
    pub backoff_probability: f64,

    /// Load-control ceiling for `backoff_probability`.
    pub max_backoff_probability: f64,

    /// Length of one backoff period.
    pub backoff_time_blocks: u32,

    /// Only packets of at most this many bytes are CRDSA candidates.
    pub payload_bytes: u32,

    /// Lowest slot index a replica may be placed in (inclusive).
    pub min_randomization_value: u32,

    /// Highest slot index a replica may be placed in (inclusive).
    pub max_randomization_value: u32,

    /// Replicas transmitted per unique packet.
    pub num_of_instances: u32,

    pub max_unique_payload_per_block: u32,

    /// After this many used blocks in a row the channel must go idle.
    pub max_consecutive_blocks_accessed: u32,

    pub min_idle_blocks: u32,
}

impl Default for AllocationChannelConfig {
    fn default() -> Self {
        Self {
            backoff_probability:             0.05,
            max_backoff_probability:         0.2,
            backoff_time_blocks:             2,
            payload_bytes:                   1_200,
            min_randomization_value:         0,
            max_randomization_value:         79,
            num_of_instances:                3,
            max_unique_payload_per_block:    3,
            max_consecutive_blocks_accessed: 6,
            min_idle_blocks:                 2,
        }
    }
}

impl AllocationChannelConfig {
    /// Number of slot indices in `[min_randomization_value, max_randomization_value]`.
    ///
    /// Zero when the bounds are inverted.
    #[inline]
    pub fn randomization_range_len(&self) -> u64 {
        if self.min_randomization_value > self.max_randomization_value {
            return 0;
        }
        u64::from(self.max_randomization_value - self.min_randomization_value) + 1
    }

    /// Run every configuration-time sanity check.
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), Violation> {
        let (min, max) = (self.min_randomization_value, self.max_randomization_value);
        if min > max {
            return Err(Violation::InvertedRandomizationRange { min, max });
        }
        if self.num_of_instances == 0 {
            return Err(Violation::ZeroInstances);
        }

        let range = self.randomization_range_len();
        if u64::from(self.num_of_instances) > range {
            return Err(Violation::TooManyInstances {
                instances: self.num_of_instances,
                range,
            });
        }
        // Replicas of different packets in one block never share a slot, so
        // the whole block's worth of replicas must fit in the range.
        let needed = u64::from(self.num_of_instances) * u64::from(self.max_unique_payload_per_block);
        if needed > range {
            return Err(Violation::TooManySlotsPerBlock { needed, range });
        }

        if !(0.0..=1.0).contains(&self.max_backoff_probability) {
            return Err(Violation::MaxBackoffProbability(self.max_backoff_probability));
        }
        if !(0.0..1.0).contains(&self.backoff_probability) {
            return Err(Violation::BackoffProbability(self.backoff_probability));
        }
        if self.backoff_probability > self.max_backoff_probability {
            return Err(Violation::BackoffAboveMaximum {
                probability: self.backoff_probability,
                maximum:     self.max_backoff_probability,
            });
        }

        if self.max_consecutive_blocks_accessed == 0 {
            return Err(Violation::ZeroConsecutiveBlocks);
        }
        Ok(())
    }
}

/// A single failed sanity check on an [`AllocationChannelConfig`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Violation {
    #[error("randomization range [{min}, {max}] is inverted")]
    InvertedRandomizationRange { min: u32, max: u32 },

    #[error("at least one packet instance is required")]
    ZeroInstances,

    #[error("{instances} instances do not fit a randomization range of {range} slots")]
    TooManyInstances { instances: u32, range: u64 },

    #[error("{needed} replica slots per block do not fit a randomization range of {range} slots")]
    TooManySlotsPerBlock { needed: u64, range: u64 },

    #[error("backoff probability {0} outside [0, 1)")]
    BackoffProbability(f64),

    #[error("maximum backoff probability {0} outside [0, 1]")]
    MaxBackoffProbability(f64),

    #[error("backoff probability {probability} exceeds maximum {maximum}")]
    BackoffAboveMaximum { probability: f64, maximum: f64 },

    #[error("maximum consecutive blocks accessed must be at least 1")]
    ZeroConsecutiveBlocks,
}
