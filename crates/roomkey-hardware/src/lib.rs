//! Card transceiver abstraction layer for the room reader terminal.
//!
//! The terminal core talks to the card chip only through the
//! [`CardTransceiver`] trait: presence polling plus the authenticate, read
//! block, write block and release primitives. The room stored on a card is
//! handled by the [`memory`] module, which owns the block layout.
//!
//! # Design
//!
//! - **Async-first**: native `async fn` in traits (Rust 1.90 + Edition 2024
//!   RPITIT).
//! - **Single owner**: a transceiver is owned by the control loop, which
//!   serializes every card operation.
//! - **Error-aware**: all operations return [`Result<T>`][error::Result] with
//!   a [`HardwareError`]. Callers collapse any of them into a failed card step.
//!
//! # Example
//!
//! ```no_run
//! use roomkey_hardware::{CardTransceiver, Result, read_room};
//!
//! async fn stored_room<T: CardTransceiver>(reader: &mut T) -> Result<Option<String>> {
//!     let Some(card) = reader.poll_card().await? else {
//!         return Ok(None);
//!     };
//!     let room = read_room(reader, &card).await;
//!     reader.release(&card).await;
//!     Ok(Some(room?.to_string()))
//! }
//! ```
//!
//! # Mock Implementations
//!
//! [`mock::MockTransceiver`] simulates a reader with an in-memory card store
//! for development and testing without physical hardware.

pub mod error;
pub mod memory;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use memory::{RoomBlock, read_room, write_room};
pub use traits::CardTransceiver;
pub use types::{CardPresence, LocalInput, ReaderInfo};
