use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("Invalid room id: {0}")]
    InvalidRoomId(String),

    #[error("Invalid reader id: {0}")]
    InvalidReaderId(String),

    #[error("Invalid card UID: {0}")]
    InvalidCardUid(String),

    // Device state errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid display line {line} (max {max})")]
    InvalidLine { line: usize, max: usize },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
