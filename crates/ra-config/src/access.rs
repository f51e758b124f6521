//! Top-level scheduler configuration.

use serde::{Deserialize, Serialize};

use ra_core::{AccessModel, AllocationChannelId};

use crate::{AllocationChannelConfig, ConfigError, ConfigResult};

// ── SlottedAlohaConfig ────────────────────────────────────────────────────────

/// Slotted ALOHA parameters, shared by every allocation channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlottedAlohaConfig {
    /// Upper bound on the randomized wait, in elementary slots.  Real-valued
    /// so it can be derived from a time interval; the draw bound is its
    /// ceiling.
    pub control_randomization_interval: f64,

    /// Size class: when set, only packets of at most this many bytes qualify
    /// for a Slotted ALOHA opportunity.  `None` lets any queued data qualify.
    #[serde(default)]
    pub payload_bytes: Option<u32>,
}

impl Default for SlottedAlohaConfig {
    fn default() -> Self {
        Self {
            control_randomization_interval: 100.0,
            payload_bytes:                  None,
        }
    }
}

impl SlottedAlohaConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let interval = self.control_randomization_interval;
        if !interval.is_finite() || interval <= 0.0 || interval.ceil() > f64::from(u32::MAX) {
            return Err(ConfigError::ControlRandomizationInterval(interval));
        }
        if self.payload_bytes == Some(0) {
            return Err(ConfigError::ZeroSlottedAlohaPayload);
        }
        Ok(())
    }

    /// Exclusive upper bound of the release-slot draw.
    ///
    /// Only meaningful on a validated config; an invalid interval yields 0.
    #[inline]
    pub fn interval_bound(&self) -> u32 {
        let interval = self.control_randomization_interval;
        if interval.is_finite() && interval > 0.0 {
            interval.ceil().min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    }
}

// ── RandomAccessConfig ────────────────────────────────────────────────────────

/// Everything the scheduler needs, set once before operation.
///
/// `channels[i]` configures `AllocationChannelId(i)`; the channel count is
/// fixed for the scheduler's lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomAccessConfig {
    pub model: AccessModel,

    #[serde(default)]
    pub slotted_aloha: SlottedAlohaConfig,

    pub channels: Vec<AllocationChannelConfig>,
}

impl RandomAccessConfig {
    pub fn new(
        model:         AccessModel,
        slotted_aloha: SlottedAlohaConfig,
        channels:      Vec<AllocationChannelConfig>,
    ) -> Self {
        Self { model, slotted_aloha, channels }
    }

    /// Number of configured allocation channels.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Run every configuration-time sanity check.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.channels.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        self.slotted_aloha.validate()?;
        for (i, channel) in self.channels.iter().enumerate() {
            channel.validate().map_err(|violation| ConfigError::Channel {
                channel: AllocationChannelId(i as u32),
                violation,
            })?;
        }
        Ok(())
    }
}
