use ra_config::ConfigError;
use ra_core::{AllocationChannelId, RaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("allocation channel {0} not configured")]
    ChannelNotFound(AllocationChannelId),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] RaError),
}

pub type EngineResult<T> = Result<T, EngineError>;
