//! Slotted ALOHA release-slot randomization.

use ra_config::{ConfigResult, SlottedAlohaConfig};
use ra_core::{RaResult, RandomSource};

/// Draw how many elementary slots to wait before the next available Tx
/// opportunity: uniform in `[0, interval_bound)`.
///
/// `interval_bound == 0` is a configuration error.
#[inline]
pub fn randomize_release_slot<R>(interval_bound: u32, rng: &mut R) -> RaResult<u32>
where
    R: RandomSource + ?Sized,
{
    rng.draw_below(interval_bound)
}

/// Stateless Slotted ALOHA algorithm bound to its configuration.
#[derive(Clone, Debug)]
pub struct SlottedAlohaEngine {
    config: SlottedAlohaConfig,
}

impl SlottedAlohaEngine {
    pub fn new(config: SlottedAlohaConfig) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &SlottedAlohaConfig {
        &self.config
    }

    /// Size class for Slotted ALOHA candidates, if one is configured.
    #[inline]
    pub fn payload_bytes(&self) -> Option<u32> {
        self.config.payload_bytes
    }

    pub fn randomize_release_slot<R>(&self, rng: &mut R) -> RaResult<u32>
    where
        R: RandomSource + ?Sized,
    {
        randomize_release_slot(self.config.interval_bound(), rng)
    }

    /// Replace the control randomization interval.  The old value is kept if
    /// the new one is invalid.
    pub fn set_control_randomization_interval(&mut self, interval: f64) -> ConfigResult<()> {
        let candidate = SlottedAlohaConfig {
            control_randomization_interval: interval,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }

    /// Replace the size class.  The old value is kept if the new one is
    /// invalid.
    pub fn set_payload_bytes(&mut self, payload_bytes: Option<u32>) -> ConfigResult<()> {
        let candidate = SlottedAlohaConfig {
            payload_bytes,
            ..self.config.clone()
        };
        candidate.validate()?;
        self.config = candidate;
        Ok(())
    }
}
