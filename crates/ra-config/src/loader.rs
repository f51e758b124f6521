//! CSV allocation-channel table loader.
//!
//! # CSV format
//!
//! One row per allocation channel.  Rows may appear in any order but the
//! `channel_id` column must cover `0..n` exactly once.
//!
//! ```csv
//! channel_id,backoff_probability,max_backoff_probability,backoff_time_blocks,payload_bytes,min_randomization_value,max_randomization_value,num_of_instances,max_unique_payload_per_block,max_consecutive_blocks_accessed,min_idle_blocks
//! 0,0.05,0.2,2,1200,0,79,3,3,6,2
//! 1,0.0,0.1,1,600,0,39,2,4,4,1
//! ```
//!
//! Every row is sanity-checked; the first failing row aborts the load.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use ra_core::AllocationChannelId;

use crate::{AllocationChannelConfig, ConfigError, ConfigResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChannelRecord {
    channel_id:                      u32,
    backoff_probability:             f64,
    max_backoff_probability:         f64,
    backoff_time_blocks:             u32,
    payload_bytes:                   u32,
    min_randomization_value:         u32,
    max_randomization_value:         u32,
    num_of_instances:                u32,
    max_unique_payload_per_block:    u32,
    max_consecutive_blocks_accessed: u32,
    min_idle_blocks:                 u32,
}

impl From<ChannelRecord> for AllocationChannelConfig {
    fn from(r: ChannelRecord) -> Self {
        Self {
            backoff_probability:             r.backoff_probability,
            max_backoff_probability:         r.max_backoff_probability,
            backoff_time_blocks:             r.backoff_time_blocks,
            payload_bytes:                   r.payload_bytes,
            min_randomization_value:         r.min_randomization_value,
            max_randomization_value:         r.max_randomization_value,
            num_of_instances:                r.num_of_instances,
            max_unique_payload_per_block:    r.max_unique_payload_per_block,
            max_consecutive_blocks_accessed: r.max_consecutive_blocks_accessed,
            min_idle_blocks:                 r.min_idle_blocks,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the allocation-channel table from a CSV file.
///
/// Returns a `Vec` indexed by `AllocationChannelId`.
pub fn load_channels_csv(path: &Path) -> ConfigResult<Vec<AllocationChannelConfig>> {
    let file = std::fs::File::open(path)?;
    load_channels_reader(file)
}

/// Like [`load_channels_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or embedding a table in a
/// binary.
pub fn load_channels_reader<R: Read>(reader: R) -> ConfigResult<Vec<AllocationChannelConfig>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut by_channel: BTreeMap<u32, AllocationChannelConfig> = BTreeMap::new();

    for result in csv_reader.deserialize::<ChannelRecord>() {
        let row = result.map_err(|e| ConfigError::Parse(e.to_string()))?;
        let channel = AllocationChannelId(row.channel_id);
        let config = AllocationChannelConfig::from(row);
        config
            .validate()
            .map_err(|violation| ConfigError::Channel { channel, violation })?;

        if by_channel.insert(channel.0, config).is_some() {
            return Err(ConfigError::DuplicateChannel(channel));
        }
    }

    if by_channel.is_empty() {
        return Err(ConfigError::NoChannels);
    }

    // BTreeMap iterates in ascending id order, so the first gap is the
    // first position where the key disagrees with the running index.
    let mut channels = Vec::with_capacity(by_channel.len());
    for (expected, (id, config)) in (0u32..).zip(by_channel) {
        if id != expected {
            return Err(ConfigError::MissingChannel(AllocationChannelId(expected)));
        }
        channels.push(config);
    }

    tracing::debug!(channels = channels.len(), "loaded allocation channel table");
    Ok(channels)
}
