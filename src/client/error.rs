// ABOUTME: Error types for the ESME session engine
// ABOUTME: Separates locally recovered protocol/payload errors from infrastructure failures

use crate::client::types::SessionState;
use crate::codec::CodecError;
use crate::datatypes::{CommandStatus, DataCoding};
use crate::store::StoreError;
use std::io;
use thiserror::Error;

/// Errors raised by the session engine.
///
/// `ProtocolStateViolation` and `PayloadDecode` are logged and recovered at
/// the dispatch boundary. `StoreUnavailable`, `ConnectionLost` and
/// `BindTimeout` are returned to the caller.
#[derive(Debug, Error)]
pub enum EsmeError {
    /// No bind response arrived within the configured window
    #[error("bind timed out")]
    BindTimeout,

    /// A PDU was sent or received in a state (or role) that does not permit it
    #[error("{command} in wrong state: {state:?}")]
    ProtocolStateViolation {
        command: &'static str,
        state: SessionState,
    },

    /// The payload did not decode under its declared charset
    #[error("failed to decode payload as {data_coding}: {reason}")]
    PayloadDecode {
        data_coding: DataCoding,
        reason: String,
    },

    /// Sequence allocation could not reach the durable store
    #[error("sequence store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// The transport is gone; outbound operations cannot proceed
    #[error("connection lost")]
    ConnectionLost,

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// SMPP protocol error indicated by a response command_status
    #[error("protocol error: {0}")]
    Protocol(CommandStatus),

    /// Data validation error (message too long, malformed addresses, etc.)
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for session operations
pub type EsmeResult<T> = Result<T, EsmeError>;

impl EsmeError {
    /// True for errors that end the session rather than a single operation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EsmeError::BindTimeout | EsmeError::ConnectionLost | EsmeError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violation_message_names_command() {
        let err = EsmeError::ProtocolStateViolation {
            command: "deliver_sm",
            state: SessionState::BoundTx,
        };
        assert_eq!(err.to_string(), "deliver_sm in wrong state: BoundTx");
    }

    #[test]
    fn store_errors_convert() {
        let err: EsmeError = StoreError::Unavailable("redis down".into()).into();
        assert!(matches!(err, EsmeError::StoreUnavailable(_)));
        assert!(!err.is_fatal());
        assert!(EsmeError::ConnectionLost.is_fatal());
    }
}
