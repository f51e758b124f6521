//! Per-allocation-channel CRDSA state.

use std::fmt;

use ra_config::{AllocationChannelConfig, Violation};

/// Where a channel stands in the backoff / rate-limit state machine.
///
/// ```text
///            draw < p                       used, count+1 == max
///   Free ───────────────▶ Backoff(k)   Free ─────────────────────▶ Idle(m)
///    ▲                       │          ▲                              │
///    └──── tick at n == 1 ───┘          └─────── tick at n == 1 ───────┘
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelStatus {
    Free,
    /// Backing off; the payload is the number of blocks left.
    Backoff(u32),
    /// Rate-limited after too many consecutive blocks; blocks left.
    Idle(u32),
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelStatus::Free       => f.write_str("free"),
            ChannelStatus::Backoff(n) => write!(f, "backoff({n})"),
            ChannelStatus::Idle(n)    => write!(f, "idle({n})"),
        }
    }
}

/// Configuration plus runtime counters of one allocation channel.
///
/// Created once per channel by [`CrdsaEngine`][crate::CrdsaEngine] and never
/// resized.  Only the engine mutates it.
#[derive(Clone, Debug)]
pub struct AllocationChannelState {
    config: AllocationChannelConfig,

    /// 0 = not backing off.
    backoff_blocks_remaining: u32,

    consecutive_blocks_used: u32,

    /// 0 = not idle.
    idle_blocks_remaining: u32,
}

impl AllocationChannelState {
    /// Fresh channel in the `Free` state.  `config` must already be valid.
    pub fn new(config: AllocationChannelConfig) -> Self {
        Self {
            config,
            backoff_blocks_remaining: 0,
            consecutive_blocks_used:  0,
            idle_blocks_remaining:    0,
        }
    }

    #[inline]
    pub fn config(&self) -> &AllocationChannelConfig {
        &self.config
    }

    #[inline]
    pub fn backoff_blocks_remaining(&self) -> u32 {
        self.backoff_blocks_remaining
    }

    #[inline]
    pub fn consecutive_blocks_used(&self) -> u32 {
        self.consecutive_blocks_used
    }

    #[inline]
    pub fn idle_blocks_remaining(&self) -> u32 {
        self.idle_blocks_remaining
    }

    /// A channel is free iff it is neither backing off nor idle.
    #[inline]
    pub fn is_free(&self) -> bool {
        self.backoff_blocks_remaining == 0 && self.idle_blocks_remaining == 0
    }

    pub fn status(&self) -> ChannelStatus {
        if self.backoff_blocks_remaining > 0 {
            ChannelStatus::Backoff(self.backoff_blocks_remaining)
        } else if self.idle_blocks_remaining > 0 {
            ChannelStatus::Idle(self.idle_blocks_remaining)
        } else {
            ChannelStatus::Free
        }
    }

    // ── Engine-only mutation ──────────────────────────────────────────────

    pub(crate) fn enter_backoff(&mut self) {
        self.backoff_blocks_remaining = self.config.backoff_time_blocks;
        self.consecutive_blocks_used = 0;
    }

    /// Count one more used block.  Returns `true` if this starts an idle
    /// period.
    pub(crate) fn register_block_used(&mut self) -> bool {
        self.consecutive_blocks_used += 1;
        if self.consecutive_blocks_used < self.config.max_consecutive_blocks_accessed {
            return false;
        }
        self.idle_blocks_remaining = self.config.min_idle_blocks;
        self.consecutive_blocks_used = 0;
        true
    }

    /// Advance one block.  Counters never go below zero.
    #[inline]
    pub(crate) fn tick(&mut self) {
        self.backoff_blocks_remaining = self.backoff_blocks_remaining.saturating_sub(1);
        self.idle_blocks_remaining = self.idle_blocks_remaining.saturating_sub(1);
    }

    /// Swap in a new configuration if it passes the sanity checks.
    ///
    /// Runtime counters are kept as they are.
    pub(crate) fn replace_config(&mut self, config: AllocationChannelConfig) -> Result<(), Violation> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}
