//! `ra-engine` — contention-access decision engines.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                     |
//! |-------------------|--------------------------------------------------------------|
//! | [`uplink`]        | `UplinkState` collaborator trait, `FixedUplink`              |
//! | [`channel`]       | `AllocationChannelState`, `ChannelStatus`                    |
//! | [`slotted_aloha`] | `SlottedAlohaEngine`, `randomize_release_slot`               |
//! | [`crdsa`]         | `CrdsaEngine`                                                |
//! | [`selector`]      | `RandomAccess`, the per-trigger access selector              |
//! | [`error`]         | `EngineError`, `EngineResult<T>`                             |
//!
//! # One evaluation
//!
//! ```text
//! RandomAccess::evaluate(channel, trigger, uplink, rng):
//!   ① decide:  model/trigger routing, DAMA and buffer queries,
//!              at most one engine run
//!   ② tick:    every channel's backoff and idle counters drop by one
//!   ③ record:  if CRDSA produced slots, count the block as used
//!              (may start an idle period)
//! ```
//!
//! Step ② happens exactly once per call whatever step ① decided, so the
//! counters advance in lock-step with the caller's triggers.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ra_config::RandomAccessConfig;
//! use ra_core::{AllocationChannelId, SimRng, TriggerKind};
//! use ra_engine::{FixedUplink, RandomAccess};
//!
//! let mut ra = RandomAccess::new(config)?;
//! let mut rng = SimRng::new(42);
//! let uplink = FixedUplink::with_packets(vec![200, 300]);
//! let op = ra.evaluate(AllocationChannelId(0), TriggerKind::Crdsa, &uplink, &mut rng)?;
//! ```

pub mod channel;
pub mod crdsa;
pub mod error;
pub mod selector;
pub mod slotted_aloha;
pub mod uplink;

#[cfg(test)]
mod tests;

pub use channel::{AllocationChannelState, ChannelStatus};
pub use crdsa::CrdsaEngine;
pub use error::{EngineError, EngineResult};
pub use selector::RandomAccess;
pub use slotted_aloha::{SlottedAlohaEngine, randomize_release_slot};
pub use uplink::{FixedUplink, UplinkState};
