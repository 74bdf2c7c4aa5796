//! Room reader terminal core.
//!
//! Ties the card transceiver and the backend client into one cooperative
//! control loop. A tick polls the backend on fixed intervals (assigned room,
//! pending writes, inspection flag, heartbeat) and then handles at most one
//! card presentation.
//!
//! ```text
//!                 ┌──────────────┐
//!   LocalInput ──▶│   Terminal   │──▶ VirtualDisplay
//!                 │              │
//!   Card ────────▶│ StateMachine │◀──▶ Backend (bounded)
//!                 └──────────────┘
//! ```
//!
//! # Modes
//!
//! - **Verify**: a card that holds the assigned room and that the backend
//!   allows unlocks the door. Everything else is denied.
//! - **Provision**: the next card is written with the target room and the
//!   result is reported. The device then returns to Verify.
//!
//! An inspection request from the backend takes priority over both modes for
//! exactly one presentation.
//!
//! # Example
//!
//! ```no_run
//! use roomkey_hardware::mock::MockTransceiver;
//! use roomkey_network::MockBackend;
//! use roomkey_terminal::{Terminal, TerminalConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> roomkey_terminal::Result<()> {
//! let config = TerminalConfig::default();
//! let (reader, _handle) = MockTransceiver::new();
//! let mut terminal = Terminal::new(&config, reader, MockBackend::new())?;
//!
//! let mut interval = tokio::time::interval(config.loop_interval());
//! loop {
//!     interval.tick().await;
//!     terminal.tick().await;
//! }
//! # }
//! ```

pub mod access;
pub mod bounded;
pub mod clock;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod display;
pub mod error;
pub mod inspection;
pub mod provision;
pub mod reconcile;
pub mod schedule;
pub mod state_machine;
pub mod sync;

pub use access::{AccessDecision, DenyReason, decide_access};
pub use bounded::BoundedBackend;
pub use clock::{FixedTimeSource, SystemTimeSource, TimeSource};
pub use config::TerminalConfig;
pub use controller::{PresentationOutcome, Terminal, TerminalStatus, TickReport};
pub use debounce::DebounceFilter;
pub use display::{Alignment, Screen, VirtualDisplay, align_text, truncate_text};
pub use error::{Result, TerminalError};
pub use inspection::{InspectionHandler, InspectionOutcome};
pub use provision::{ProvisionOutcome, provision_card};
pub use reconcile::{ReconcileOutcome, ReconcileQuery, reconcile_pending_write};
pub use schedule::{PollSchedule, Poller};
pub use state_machine::{
    DeviceMode, ModeTransition, RoomUpdate, StateMachine, TargetOrigin, TransitionCause,
    WriteTarget,
};
pub use sync::{SyncOutcome, sync_assigned_room};
