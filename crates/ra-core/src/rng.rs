//! Uniform random sources for the scheduler.
//!
//! # Determinism strategy
//!
//! The scheduler never touches global random state.  Every draw goes through
//! a [`RandomSource`] handed in by the caller, so a run is fully reproducible
//! from its seed and tests can script exact draw sequences.
//!
//! Terminals sharing one global seed each get their own `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (terminal_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive terminal IDs uniformly across the seed space.
//! Adding terminals at the end of the population never disturbs the streams
//! of existing ones.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{RaError, RaResult, TerminalId};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

// ── RandomSource ──────────────────────────────────────────────────────────────

/// The two uniform draws the scheduler needs.
///
/// Implementations must be uniform; the engines rely on it for the fairness
/// of slot selection and backoff decisions.
pub trait RandomSource {
    /// Uniform integer in `[lo, hi]` (both inclusive).
    ///
    /// Callers guarantee `lo <= hi`; use [`try_draw_int`][Self::try_draw_int]
    /// when that is not known statically.
    fn draw_int(&mut self, lo: u32, hi: u32) -> u32;

    /// Uniform real in `[0, 1)`.
    fn draw_real01(&mut self) -> f64;

    /// Checked [`draw_int`][Self::draw_int].
    fn try_draw_int(&mut self, lo: u32, hi: u32) -> RaResult<u32> {
        if lo > hi {
            return Err(RaError::InvertedRange { lo, hi });
        }
        Ok(self.draw_int(lo, hi))
    }

    /// Uniform integer in `[0, bound)`.
    fn draw_below(&mut self, bound: u32) -> RaResult<u32> {
        match bound {
            0 => Err(RaError::ZeroBound),
            b => Ok(self.draw_int(0, b - 1)),
        }
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Scheduler-level RNG for a single terminal or a whole single-threaded run.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Derive a child `SimRng` with a different seed offset.
    pub fn child(&mut self, offset: u64) -> SimRng {
        let child_seed: u64 = self.0.r#gen::<u64>() ^ offset.wrapping_mul(MIXING_CONSTANT);
        SimRng(SmallRng::seed_from_u64(child_seed))
    }
}

impl RandomSource for SimRng {
    #[inline]
    fn draw_int(&mut self, lo: u32, hi: u32) -> u32 {
        self.0.gen_range(lo..=hi)
    }

    #[inline]
    fn draw_real01(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }
}

// ── TerminalRng ───────────────────────────────────────────────────────────────

/// Per-terminal deterministic RNG.
///
/// Independently deciding terminals must not share a stream, otherwise two
/// terminals with identical queues would pick identical slots every block.
pub struct TerminalRng(SmallRng);

impl TerminalRng {
    /// Seed deterministically from the run's global seed and a terminal ID.
    pub fn new(global_seed: u64, terminal: TerminalId) -> Self {
        let seed = global_seed ^ (terminal.0 as u64).wrapping_mul(MIXING_CONSTANT);
        TerminalRng(SmallRng::seed_from_u64(seed))
    }
}

impl RandomSource for TerminalRng {
    #[inline]
    fn draw_int(&mut self, lo: u32, hi: u32) -> u32 {
        self.0.gen_range(lo..=hi)
    }

    #[inline]
    fn draw_real01(&mut self) -> f64 {
        self.0.r#gen::<f64>()
    }
}
