use std::time::Duration;

use thiserror::Error;

/// Why a single subscriber could not be handed an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("Subscriber channel is closed")]
    Closed,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Send timed out after {0:?}")]
    TimedOut(Duration),
}

pub type DeliveryResult<T> = Result<T, DeliveryError>;
