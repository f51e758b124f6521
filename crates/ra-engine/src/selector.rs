//! `RandomAccess` — the top-level access selector.

use ra_config::{RandomAccessConfig, SlottedAlohaConfig};
use ra_core::{
    AccessModel, AllocationChannelId, Block, OpportunityKind, RandomSource, TriggerKind,
    TxOpportunity,
};

use crate::{
    AllocationChannelState, CrdsaEngine, EngineResult, SlottedAlohaEngine, UplinkState,
};

/// Decides, once per trigger, whether the terminal may attempt an
/// opportunistic transmission and where.
///
/// # Decision table
///
/// Evaluated in order, first match wins:
///
/// | # | Condition                                              | Result                    |
/// |---|--------------------------------------------------------|---------------------------|
/// | 1 | model is `Off`, or does not enable the trigger's algorithm | none                  |
/// | 2 | DAMA grant available                                   | none                      |
/// | 3 | Slotted ALOHA: buffers empty / no packet in size class | none                      |
/// | 4 | Slotted ALOHA otherwise                                | release slot              |
/// | 5 | CRDSA                                                  | whatever the engine says  |
///
/// Slotted ALOHA and CRDSA keep independent state: a Slotted ALOHA
/// opportunity never counts as a used CRDSA block.
///
/// `evaluate` takes `&mut self`, so it cannot be re-entered while a previous
/// call is still running.
#[derive(Clone, Debug)]
pub struct RandomAccess {
    model:         AccessModel,
    slotted_aloha: SlottedAlohaEngine,
    crdsa:         CrdsaEngine,
    /// Evaluations performed so far.
    block:         Block,
}

impl RandomAccess {
    /// Validate `config` and build a ready-to-evaluate selector.
    pub fn new(config: RandomAccessConfig) -> EngineResult<Self> {
        config.validate()?;
        let RandomAccessConfig { model, slotted_aloha, channels } = config;
        Ok(Self {
            model,
            slotted_aloha: SlottedAlohaEngine::new(slotted_aloha)?,
            crdsa:         CrdsaEngine::new(channels)?,
            block:         Block::ZERO,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn model(&self) -> AccessModel {
        self.model
    }

    /// Number of evaluations performed so far.
    #[inline]
    pub fn block(&self) -> Block {
        self.block
    }

    #[inline]
    pub fn crdsa(&self) -> &CrdsaEngine {
        &self.crdsa
    }

    #[inline]
    pub fn slotted_aloha(&self) -> &SlottedAlohaEngine {
        &self.slotted_aloha
    }

    pub fn channel(&self, channel: AllocationChannelId) -> EngineResult<&AllocationChannelState> {
        self.crdsa.channel(channel)
    }

    /// Advisory: CRDSA on `channel` is unlikely to transmit soon.
    ///
    /// `evaluate` never acts on this by itself; with `AnyAvailable` a caller
    /// may use it to prefer firing a Slotted ALOHA trigger instead.
    pub fn is_crdsa_backoff_probability_too_high(
        &self,
        channel: AllocationChannelId,
    ) -> EngineResult<bool> {
        self.crdsa.is_backoff_probability_too_high(channel)
    }

    // ── Evaluation ────────────────────────────────────────────────────────

    /// Evaluate one trigger on `channel`.
    ///
    /// Ticks every channel's backoff and idle counters exactly once, whatever
    /// the outcome.  An unknown `channel` is a configuration error and leaves
    /// all state untouched.
    pub fn evaluate<U, R>(
        &mut self,
        channel: AllocationChannelId,
        trigger: TriggerKind,
        uplink:  &U,
        rng:     &mut R,
    ) -> EngineResult<TxOpportunity>
    where
        U: UplinkState + ?Sized,
        R: RandomSource + ?Sized,
    {
        self.crdsa.channel(channel)?;

        let opportunity = self.decide(channel, trigger, uplink, rng)?;

        let used = (opportunity.kind() == OpportunityKind::Crdsa).then_some(channel);
        self.crdsa.end_block(used);

        tracing::trace!(
            block = %self.block,
            %channel,
            %trigger,
            outcome = %opportunity.kind(),
            "random access evaluated"
        );
        self.block = self.block.next();
        Ok(opportunity)
    }

    fn decide<U, R>(
        &mut self,
        channel: AllocationChannelId,
        trigger: TriggerKind,
        uplink:  &U,
        rng:     &mut R,
    ) -> EngineResult<TxOpportunity>
    where
        U: UplinkState + ?Sized,
        R: RandomSource + ?Sized,
    {
        if !self.model.accepts(trigger) {
            return Ok(TxOpportunity::none(channel));
        }
        if uplink.is_dama_available() {
            return Ok(TxOpportunity::none(channel));
        }

        match trigger {
            TriggerKind::SlottedAloha => {
                if uplink.are_buffers_empty() {
                    return Ok(TxOpportunity::none(channel));
                }
                if let Some(max_bytes) = self.slotted_aloha.payload_bytes() {
                    if uplink.num_candidate_packets(max_bytes) == 0 {
                        return Ok(TxOpportunity::none(channel));
                    }
                }
                let release_slot = self.slotted_aloha.randomize_release_slot(rng)?;
                tracing::debug!(%channel, release_slot, "slotted ALOHA opportunity");
                Ok(TxOpportunity::slotted_aloha(channel, release_slot))
            }

            TriggerKind::Crdsa => {
                if self.model == AccessModel::AnyAvailable
                    && self.crdsa.is_backoff_probability_too_high(channel)?
                {
                    tracing::debug!(
                        %channel,
                        "CRDSA backoff probability too high, attempting CRDSA regardless"
                    );
                }
                self.crdsa.prepare_to_transmit(channel, uplink, rng)
            }
        }
    }

    // ── Runtime parameter updates ─────────────────────────────────────────
    //
    // Every update is validated against the channel's resulting
    // configuration and rejected as a whole; runtime counters are kept.

    pub fn set_model(&mut self, model: AccessModel) {
        tracing::debug!(from = %self.model, to = %model, "random access model changed");
        self.model = model;
    }

    pub fn set_load_control_parameters(
        &mut self,
        channel:             AllocationChannelId,
        backoff_probability: f64,
        backoff_time_blocks: u32,
    ) -> EngineResult<()> {
        self.crdsa.reconfigure(channel, |c| {
            c.backoff_probability = backoff_probability;
            c.backoff_time_blocks = backoff_time_blocks;
        })
    }

    pub fn set_maximum_backoff_probability(
        &mut self,
        channel:                 AllocationChannelId,
        max_backoff_probability: f64,
    ) -> EngineResult<()> {
        self.crdsa.reconfigure(channel, |c| {
            c.max_backoff_probability = max_backoff_probability;
        })
    }

    pub fn set_payload_bytes(&mut self, channel: AllocationChannelId, payload_bytes: u32) -> EngineResult<()> {
        self.crdsa.reconfigure(channel, |c| c.payload_bytes = payload_bytes)
    }

    pub fn set_randomization_parameters(
        &mut self,
        channel:                 AllocationChannelId,
        min_randomization_value: u32,
        max_randomization_value: u32,
        num_of_instances:        u32,
    ) -> EngineResult<()> {
        self.crdsa.reconfigure(channel, |c| {
            c.min_randomization_value = min_randomization_value;
            c.max_randomization_value = max_randomization_value;
            c.num_of_instances = num_of_instances;
        })
    }

    pub fn set_rate_limitation_parameters(
        &mut self,
        channel:                         AllocationChannelId,
        max_unique_payload_per_block:    u32,
        max_consecutive_blocks_accessed: u32,
        min_idle_blocks:                 u32,
    ) -> EngineResult<()> {
        self.crdsa.reconfigure(channel, |c| {
            c.max_unique_payload_per_block = max_unique_payload_per_block;
            c.max_consecutive_blocks_accessed = max_consecutive_blocks_accessed;
            c.min_idle_blocks = min_idle_blocks;
        })
    }

    pub fn set_control_randomization_interval(&mut self, interval: f64) -> EngineResult<()> {
        self.slotted_aloha.set_control_randomization_interval(interval)?;
        Ok(())
    }

    pub fn set_slotted_aloha_payload_bytes(&mut self, payload_bytes: Option<u32>) -> EngineResult<()> {
        self.slotted_aloha.set_payload_bytes(payload_bytes)?;
        Ok(())
    }

    // ── Diagnostics ───────────────────────────────────────────────────────

    /// Dump the model, Slotted ALOHA parameters, and every channel's
    /// configuration and counters at `debug` level.
    pub fn log_variables(&self) {
        let SlottedAlohaConfig { control_randomization_interval, payload_bytes } =
            self.slotted_aloha.config();
        tracing::debug!(
            model = %self.model,
            block = %self.block,
            control_randomization_interval,
            slotted_aloha_payload_bytes = ?payload_bytes,
            channels = self.crdsa.channel_count(),
            "random access variables"
        );
        for (i, state) in self.crdsa.channels().iter().enumerate() {
            let c = state.config();
            tracing::debug!(
                channel = i,
                status = %state.status(),
                backoff_probability = c.backoff_probability,
                max_backoff_probability = c.max_backoff_probability,
                backoff_time_blocks = c.backoff_time_blocks,
                payload_bytes = c.payload_bytes,
                min_randomization_value = c.min_randomization_value,
                max_randomization_value = c.max_randomization_value,
                num_of_instances = c.num_of_instances,
                max_unique_payload_per_block = c.max_unique_payload_per_block,
                max_consecutive_blocks_accessed = c.max_consecutive_blocks_accessed,
                min_idle_blocks = c.min_idle_blocks,
                consecutive_blocks_used = state.consecutive_blocks_used(),
                "allocation channel"
            );
        }
    }
}
