use chatloom_protocol::{ThreadStreamEvent, UpdateError};
use chatloom_store::StoreError;
use thiserror::Error;

/// Failure during turn production. Terminates the event sequence.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Protocol-level stream failure with a user-facing message and a
    /// retry hint. Recoverable from the client's point of view.
    #[error("{message}")]
    Stream { message: String, allow_retry: bool },

    /// Store failure while persisting a snapshot.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The engine produced an update its own snapshot cannot absorb.
    #[error(transparent)]
    Update(#[from] UpdateError),
}

impl TurnError {
    /// Convert into the terminal wire event.
    pub fn into_event(self) -> ThreadStreamEvent {
        match self {
            TurnError::Stream {
                message,
                allow_retry,
            } => ThreadStreamEvent::error(message, allow_retry),
            other => ThreadStreamEvent::error(other.to_string(), false),
        }
    }
}
