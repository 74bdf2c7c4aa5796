//! Card transceiver errors.
//!
//! All of these are card I/O failures. Callers never branch on the variant:
//! on the read path any error counts as a room mismatch, on the write path as
//! a failed write. The variants exist for logs.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The transceiver link is gone.
    #[error("Transceiver disconnected: {reason}")]
    Disconnected { reason: String },

    /// The card left the field or was never seen.
    #[error("Card {uid} not in field")]
    NoCard { uid: String },

    /// Key A was rejected for the room sector.
    #[error("Sector authentication failed for card {uid}")]
    AuthenticationFailed { uid: String },

    #[error("Block read failed: {message}")]
    CardReadError { message: String },

    #[error("Block write failed: {message}")]
    CardWriteError { message: String },

    /// Malformed UID or block content.
    #[error("Invalid card data: {message}")]
    InvalidData { message: String },
}

impl HardwareError {
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected {
            reason: reason.into(),
        }
    }

    pub fn no_card(uid: impl Into<String>) -> Self {
        Self::NoCard { uid: uid.into() }
    }

    pub fn authentication_failed(uid: impl Into<String>) -> Self {
        Self::AuthenticationFailed { uid: uid.into() }
    }

    pub fn card_read(message: impl Into<String>) -> Self {
        Self::CardReadError {
            message: message.into(),
        }
    }

    pub fn card_write(message: impl Into<String>) -> Self {
        Self::CardWriteError {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }
}
