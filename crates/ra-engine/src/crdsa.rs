//! Contention Resolution Diversity Slotted ALOHA.
//!
//! Each unique packet is sent as `num_of_instances` replicas in distinct,
//! randomly chosen slots of the frame.  The receiver uses a clean replica to
//! cancel the others' interference, so collisions between terminals are
//! expected and resolved downstream.  Within one terminal and one block no
//! two replicas ever share a slot.
//!
//! Load control and rate limiting are per allocation channel:
//!
//! - **Backoff**: a free channel backs off with `backoff_probability` for
//!   `backoff_time_blocks` blocks.
//! - **Idle**: after `max_consecutive_blocks_accessed` used blocks the
//!   channel stays silent for `min_idle_blocks` blocks.

use std::collections::BTreeSet;

use ra_config::{AllocationChannelConfig, ConfigError, ConfigResult};
use ra_core::{AllocationChannelId, RandomSource, TxOpportunity};

use crate::{AllocationChannelState, EngineError, EngineResult, UplinkState};

/// Redraws allowed per replica before falling back to an exact draw over the
/// remaining free slots.
const MAX_SLOT_DRAWS: u32 = 64;

/// Per-channel CRDSA state machine and replica-slot randomizer.
///
/// Owns the state of every allocation channel in a dense `Vec` indexed by
/// `AllocationChannelId`; the channel count is fixed at construction.
#[derive(Clone, Debug)]
pub struct CrdsaEngine {
    channels: Vec<AllocationChannelState>,
}

impl CrdsaEngine {
    /// Validate every channel configuration and build the engine.
    pub fn new(configs: Vec<AllocationChannelConfig>) -> ConfigResult<Self> {
        if configs.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        let channels = configs
            .into_iter()
            .enumerate()
            .map(|(i, config)| {
                config.validate().map_err(|violation| ConfigError::Channel {
                    channel: AllocationChannelId(i as u32),
                    violation,
                })?;
                Ok(AllocationChannelState::new(config))
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self { channels })
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// All channel states, indexed by `AllocationChannelId`.
    #[inline]
    pub fn channels(&self) -> &[AllocationChannelState] {
        &self.channels
    }

    pub fn channel(&self, channel: AllocationChannelId) -> EngineResult<&AllocationChannelState> {
        self.channels
            .get(channel.index())
            .ok_or(EngineError::ChannelNotFound(channel))
    }

    fn channel_mut(&mut self, channel: AllocationChannelId) -> EngineResult<&mut AllocationChannelState> {
        self.channels
            .get_mut(channel.index())
            .ok_or(EngineError::ChannelNotFound(channel))
    }

    /// `true` if the configured backoff probability exceeds its maximum or
    /// the channel is currently backing off.
    pub fn is_backoff_probability_too_high(&self, channel: AllocationChannelId) -> EngineResult<bool> {
        let state = self.channel(channel)?;
        let config = state.config();
        Ok(config.backoff_probability > config.max_backoff_probability
            || state.backoff_blocks_remaining() > 0)
    }

    /// Decide whether `channel` transmits this block and where.
    ///
    /// Does not tick or record usage; the caller finishes the block with
    /// [`end_block`][Self::end_block].
    pub fn prepare_to_transmit<U, R>(
        &mut self,
        channel: AllocationChannelId,
        uplink:  &U,
        rng:     &mut R,
    ) -> EngineResult<TxOpportunity>
    where
        U: UplinkState + ?Sized,
        R: RandomSource + ?Sized,
    {
        let state = self.channel_mut(channel)?;
        if !state.is_free() {
            tracing::trace!(%channel, status = %state.status(), "channel not free");
            return Ok(TxOpportunity::none(channel));
        }

        if rng.draw_real01() < state.config().backoff_probability {
            state.enter_backoff();
            tracing::debug!(
                %channel,
                blocks = state.backoff_blocks_remaining(),
                "CRDSA backoff"
            );
            return Ok(TxOpportunity::none(channel));
        }

        let config = state.config();
        let candidates = uplink.num_candidate_packets(config.payload_bytes);
        let packets = candidates.min(config.max_unique_payload_per_block);
        if packets == 0 {
            return Ok(TxOpportunity::none(channel));
        }

        let slot_sets = randomize_slot_sets(config, packets, rng);
        tracing::debug!(
            %channel,
            candidates,
            packets = slot_sets.len(),
            replicas = config.num_of_instances,
            "CRDSA opportunity"
        );
        Ok(TxOpportunity::crdsa(channel, slot_sets))
    }

    /// Close the current block: tick every channel, then count the block as
    /// used on `used` (the channel that produced a CRDSA opportunity, if any).
    ///
    /// Ticking first means an idle period started here begins with the next
    /// block, while a backoff drawn this block already counts it.
    pub fn end_block(&mut self, used: Option<AllocationChannelId>) {
        for state in &mut self.channels {
            state.tick();
        }
        let Some(channel) = used else { return };
        if let Some(state) = self.channels.get_mut(channel.index()) {
            if state.register_block_used() {
                tracing::debug!(
                    %channel,
                    blocks = state.idle_blocks_remaining(),
                    "CRDSA consecutive-block limit reached, idling"
                );
            }
        }
    }

    /// Apply `update` to a copy of the channel's configuration and keep it
    /// only if it still passes the sanity checks.
    pub fn reconfigure<F>(&mut self, channel: AllocationChannelId, update: F) -> EngineResult<()>
    where
        F: FnOnce(&mut AllocationChannelConfig),
    {
        let state = self.channel_mut(channel)?;
        let mut config = state.config().clone();
        update(&mut config);
        state
            .replace_config(config)
            .map_err(|violation| ConfigError::Channel { channel, violation })?;
        Ok(())
    }
}

// ── Slot randomization ────────────────────────────────────────────────────────

/// Randomize `packets` slot sets of `num_of_instances` distinct slots each.
///
/// Slots reserved by an earlier packet of the same block are excluded.
fn randomize_slot_sets<R>(
    config:  &AllocationChannelConfig,
    packets: u32,
    rng:     &mut R,
) -> Vec<BTreeSet<u32>>
where
    R: RandomSource + ?Sized,
{
    let replicas = config.num_of_instances as usize;
    let mut reserved: BTreeSet<u32> = BTreeSet::new();
    let mut slot_sets = Vec::with_capacity(packets as usize);

    for _ in 0..packets {
        let mut slots = BTreeSet::new();
        while slots.len() < replicas {
            let Some(slot) = draw_free_slot(config, &reserved, rng) else {
                // Unreachable for a validated config: the whole block fits
                // the randomization range.
                tracing::warn!(reserved = reserved.len(), "randomization range exhausted");
                return slot_sets;
            };
            reserved.insert(slot);
            slots.insert(slot);
        }
        slot_sets.push(slots);
    }
    slot_sets
}

/// Draw a slot in the randomization range that is not in `reserved`.
///
/// Rejection sampling first; after [`MAX_SLOT_DRAWS`] duplicates, pick
/// uniformly among the slots still free.  Returns `None` only if every slot
/// is reserved.
fn draw_free_slot<R>(
    config:   &AllocationChannelConfig,
    reserved: &BTreeSet<u32>,
    rng:      &mut R,
) -> Option<u32>
where
    R: RandomSource + ?Sized,
{
    let (lo, hi) = (config.min_randomization_value, config.max_randomization_value);

    for _ in 0..MAX_SLOT_DRAWS {
        let slot = rng.draw_int(lo, hi);
        if !reserved.contains(&slot) {
            return Some(slot);
        }
        tracing::trace!(slot, "slot already reserved this block, redrawing");
    }

    let free = config.randomization_range_len().checked_sub(reserved.len() as u64)?;
    if free == 0 {
        return None;
    }
    tracing::warn!(
        attempts = MAX_SLOT_DRAWS,
        free,
        "slot redraw limit hit, drawing from remaining free slots"
    );
    let pick = rng.draw_int(0, (free - 1) as u32);
    (lo..=hi).filter(|s| !reserved.contains(s)).nth(pick as usize)
}
