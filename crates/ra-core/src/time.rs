//! Scheduler time model.
//!
//! The scheduler has no notion of wall-clock time.  Its only clock is the
//! `Block`: one evaluation of the access selector is one block, and every
//! backoff and idle counter is expressed in blocks.  Mapping a block onto a
//! superframe or a millisecond timestamp is the caller's business.

use std::fmt;

/// An absolute block counter.
///
/// Stored as `u64`: a terminal evaluating once per 10 ms superframe would
/// need ~5.8 billion years to overflow it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block(pub u64);

impl Block {
    pub const ZERO: Block = Block(0);

    /// The block immediately after `self`.
    #[inline]
    pub fn next(self) -> Block {
        Block(self.0 + 1)
    }

    /// Blocks elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: Block) -> u64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<u64> for Block {
    type Output = Block;
    #[inline]
    fn add(self, rhs: u64) -> Block {
        Block(self.0 + rhs)
    }
}

impl std::ops::Sub for Block {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Block) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}
