//! `ra-core` — foundational types for the random-access scheduler.
//!
//! This crate is a dependency of every other `ra-*` crate.  It intentionally
//! has no `ra-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `AllocationChannelId`, `TerminalId`                       |
//! | [`time`]        | `Block`, one scheduling tick                              |
//! | [`rng`]         | `RandomSource` trait, `SimRng`, `TerminalRng`             |
//! | [`access`]      | `AccessModel`, `TriggerKind`                              |
//! | [`opportunity`] | `TxOpportunity`, `Opportunity`, `OpportunityKind`         |
//! | [`error`]       | `RaError`, `RaResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by `ra-config`.                                   |

pub mod access;
pub mod error;
pub mod ids;
pub mod opportunity;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use access::{AccessModel, TriggerKind};
pub use error::{RaError, RaResult};
pub use ids::{AllocationChannelId, TerminalId};
pub use opportunity::{Opportunity, OpportunityKind, TxOpportunity};
pub use rng::{RandomSource, SimRng, TerminalRng};
pub use time::Block;
