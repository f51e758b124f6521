use ra_core::AllocationChannelId;
use thiserror::Error;

use crate::Violation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{channel}: {violation}")]
    Channel {
        channel:   AllocationChannelId,
        violation: Violation,
    },

    #[error("control randomization interval must be positive and finite, got {0}")]
    ControlRandomizationInterval(f64),

    #[error("slotted ALOHA payload size class must be positive")]
    ZeroSlottedAlohaPayload,

    #[error("no allocation channels configured")]
    NoChannels,

    #[error("allocation channel {0} defined more than once")]
    DuplicateChannel(AllocationChannelId),

    #[error("allocation channel ids must be dense: {0} is missing")]
    MissingChannel(AllocationChannelId),

    #[error("channel table parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
