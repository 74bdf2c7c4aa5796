//! Card transceiver trait definition.
//!
//! The terminal core never touches SPI or the chip directly; it calls into a
//! [`CardTransceiver`] for the four primitive card operations plus presence
//! polling. Implementations are owned by the single control loop, so every
//! card operation is serialized behind one owner.
//!
//! All methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT),
//! without the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::memory::RoomBlock;
use crate::types::{CardPresence, ReaderInfo};

/// Card transceiver abstraction.
///
/// A card session is: [`poll_card`](Self::poll_card) yields a presence,
/// [`authenticate`](Self::authenticate) unlocks the room sector, then
/// [`read_block`](Self::read_block) or [`write_block`](Self::write_block)
/// touch the room block, and [`release`](Self::release) halts the card and
/// drops the crypto session. `release` is always called, whatever the
/// outcome of the other steps.
///
/// # Object Safety
///
/// Like every device trait using `async fn`, this trait is not object-safe.
/// Use generic type parameters:
///
/// ```no_run
/// use roomkey_hardware::{CardTransceiver, Result};
///
/// async fn wait_for_card<T: CardTransceiver>(reader: &mut T) -> Result<String> {
///     loop {
///         if let Some(card) = reader.poll_card().await? {
///             reader.release(&card).await;
///             return Ok(card.uid.to_string());
///         }
///     }
/// }
/// ```
pub trait CardTransceiver: Send + Sync {
    /// Check for a newly presented card.
    ///
    /// Non-blocking: returns `Ok(None)` when no new card is in the field.
    ///
    /// # Errors
    ///
    /// Returns an error if the transceiver is disconnected.
    async fn poll_card(&mut self) -> Result<Option<CardPresence>>;

    /// Authenticate the room sector of the card with key A.
    ///
    /// # Errors
    ///
    /// Returns an error if the card rejects the key or left the field.
    async fn authenticate(&mut self, card: &CardPresence) -> Result<()>;

    /// Read the room block. Requires a prior successful `authenticate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the card is not authenticated or the read fails.
    async fn read_block(&mut self, card: &CardPresence) -> Result<RoomBlock>;

    /// Write the room block. Requires a prior successful `authenticate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the card is not authenticated or the write fails.
    async fn write_block(&mut self, card: &CardPresence, block: &RoomBlock) -> Result<()>;

    /// Halt the card and end the crypto session. Never fails.
    async fn release(&mut self, card: &CardPresence);

    /// Get transceiver information.
    ///
    /// # Errors
    ///
    /// Returns an error if the transceiver cannot be queried.
    async fn get_reader_info(&self) -> Result<ReaderInfo>;
}
