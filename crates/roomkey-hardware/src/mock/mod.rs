//! Mock device implementations for testing and development.
//!
//! Simulated devices that can be controlled programmatically without
//! physical hardware.

pub mod transceiver;

pub use transceiver::{CardOperation, MockTransceiver, MockTransceiverHandle};
