//! Backend error taxonomy.
//!
//! Transport-family failures (unreachable, non-2xx, timeout) and parse
//! failures are never fatal: call sites fall back to their conservative
//! outcome and log the error.

use std::fmt;

use thiserror::Error;

/// Backend operation, used to label errors and recorded calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    ReaderRoom,
    PendingInspection,
    ConfirmInspection,
    SubmitCardRead,
    PendingWrite,
    AnyPendingWrite,
    ConfirmWrite,
}

impl fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReaderRoom => "reader-config",
            Self::PendingInspection => "inspect-card/pending",
            Self::ConfirmInspection => "inspect-card/confirm",
            Self::SubmitCardRead => "read",
            Self::PendingWrite => "pending-write",
            Self::AnyPendingWrite => "any-pending-write",
            Self::ConfirmWrite => "confirm-write",
        };
        write!(f, "{name}")
    }
}

/// Errors that can occur while calling the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Network unreachable, connection reset, or similar.
    #[error("{operation}: transport error: {message}")]
    Transport {
        operation: BackendOperation,
        message: String,
    },

    /// The backend answered with a non-2xx status.
    #[error("{operation}: HTTP {status}")]
    Status {
        operation: BackendOperation,
        status: u16,
    },

    /// The call did not complete within its time bound.
    #[error("{operation}: timed out after {timeout_ms}ms")]
    Timeout {
        operation: BackendOperation,
        timeout_ms: u64,
    },

    /// The response body was malformed or unexpected.
    #[error("{operation}: malformed response: {message}")]
    Parse {
        operation: BackendOperation,
        message: String,
    },

    /// The HTTP client could not be set up.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl BackendError {
    pub fn transport(operation: BackendOperation, message: impl Into<String>) -> Self {
        Self::Transport {
            operation,
            message: message.into(),
        }
    }

    pub fn parse(operation: BackendOperation, message: impl Into<String>) -> Self {
        Self::Parse {
            operation,
            message: message.into(),
        }
    }

    pub fn timeout(operation: BackendOperation, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation,
            timeout_ms,
        }
    }

    /// `true` for parse failures.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// `true` for transport-family failures (transport, status, timeout).
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::Timeout { .. }
        )
    }

    /// The operation that failed, if any.
    #[must_use]
    pub fn operation(&self) -> Option<BackendOperation> {
        match self {
            Self::Transport { operation, .. }
            | Self::Status { operation, .. }
            | Self::Timeout { operation, .. }
            | Self::Parse { operation, .. } => Some(*operation),
            Self::Client(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;
