//! Error types for the signal transport.

use std::io;

use thiserror::Error;

use crate::protocol::{Notification, Pid};

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Every failure here is fatal to the process: there is no buffering to
/// retry against.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Target pid is not a positive integer.
    #[error("invalid PID: {0:?}")]
    InvalidPid(String),

    /// Message carries the reserved terminator byte.
    #[error("message contains a zero byte at offset {offset}")]
    EmbeddedTerminator { offset: usize },

    /// `sigaction` refused the handler.
    #[error("failed to register {signal} handler: {source}")]
    Register {
        signal: &'static str,
        #[source]
        source: io::Error,
    },

    /// `kill` failed: target vanished or permission denied.
    #[error("failed to send {kind} to {pid}: {source}")]
    Notify {
        kind: Notification,
        pid: Pid,
        #[source]
        source: io::Error,
    },

    /// Receiver handler could not acknowledge a bit.
    #[error("acknowledgment to {pid} failed: {source}")]
    AckFault {
        pid: i32,
        #[source]
        source: io::Error,
    },

    /// Self-pipe used to wake the main flow failed.
    #[error("wake pipe error: {0}")]
    Wake(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl TransportError {
    /// Builds a platform error from the current `errno`.
    pub(crate) fn last_os_error_for_register(signal: &'static str) -> Self {
        Self::Register {
            signal,
            source: io::Error::last_os_error(),
        }
    }
}
