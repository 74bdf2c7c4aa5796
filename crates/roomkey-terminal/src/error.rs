//! Terminal error type.
//!
//! Aggregates the per-crate errors so the controller can log any step
//! failure through one type. Nothing here is fatal to the control loop.

use roomkey_hardware::HardwareError;
use roomkey_network::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Card error: {0}")]
    Card(#[from] HardwareError),

    #[error(transparent)]
    Core(#[from] roomkey_core::Error),
}

pub type Result<T> = std::result::Result<T, TerminalError>;
