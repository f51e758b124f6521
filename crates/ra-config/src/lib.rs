//! `ra-config` — scheduler configuration, sanity checks, and table loading.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                        |
//! |--------------|-----------------------------------------------------------------|
//! | [`channel`]  | `AllocationChannelConfig`, `Violation`                          |
//! | [`access`]   | `SlottedAlohaConfig`, `RandomAccessConfig`                      |
//! | [`loader`]   | `load_channels_csv`, `load_channels_reader`                     |
//! | [`error`]    | `ConfigError`, `ConfigResult<T>`                                |
//!
//! Every check here runs once, before the scheduler is built.  A scheduler
//! never evaluates against a configuration that failed validation.

pub mod access;
pub mod channel;
pub mod error;
pub mod loader;


pub use access::{RandomAccessConfig, SlottedAlohaConfig};
pub use channel::{AllocationChannelConfig, Violation};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_channels_csv, load_channels_reader};
