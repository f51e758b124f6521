//! Core error type.
//!
//! Sub-crates define their own error enums (`ConfigError`, `EngineError`);
//! `EngineError` wraps `RaError` for draws made during an evaluation.

use thiserror::Error;

/// Errors raised by `ra-core` primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RaError {
    #[error("draw range [{lo}, {hi}] is empty")]
    InvertedRange { lo: u32, hi: u32 },

    #[error("draw bound must be positive")]
    ZeroBound,

    #[error("unknown access model {0:?}: expected \"off\", \"slotted-aloha\", \"crdsa\", or \"any-available\"")]
    UnknownModel(String),
}

/// Shorthand result type for `ra-core`.
pub type RaResult<T> = Result<T, RaError>;
