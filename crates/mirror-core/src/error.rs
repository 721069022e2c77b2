//! Classification errors for change-event handling.

use thiserror::Error;

/// Raised when a change record does not match any shape this replicator
/// understands. Always fatal: it signals an incompatible source version,
/// not a transient condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),

    #[error("unknown event type: {0:?}")]
    UnknownEventType(String),

    #[error("{event_type} event is missing required field {field:?}")]
    MissingField {
        event_type: &'static str,
        field: &'static str,
    },

    #[error("{operation} event carries no after-state")]
    MissingAfterState { operation: &'static str },
}

impl EventError {
    pub(crate) fn missing(event_type: &'static str, field: &'static str) -> Self {
        Self::MissingField { event_type, field }
    }
}
