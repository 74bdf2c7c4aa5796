//! Room block codec and card-level room operations.
//!
//! A card stores its room in exactly one fixed-size block: the room's bytes,
//! truncated to the block size and zero padded. On read, content ends at the
//! first zero byte.
//!
//! ```
//! use roomkey_core::RoomId;
//! use roomkey_hardware::RoomBlock;
//!
//! let block = RoomBlock::encode(&RoomId::new("101").unwrap());
//! assert_eq!(&block.as_bytes()[..4], b"101\0");
//! assert_eq!(block.decode().unwrap().as_str(), "101");
//! ```

use roomkey_core::RoomId;
use roomkey_core::constants::ROOM_BLOCK_SIZE;
use tracing::trace;

use crate::error::{HardwareError, Result};
use crate::traits::CardTransceiver;
use crate::types::CardPresence;

/// Raw contents of the room block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomBlock([u8; ROOM_BLOCK_SIZE]);

impl RoomBlock {
    /// An all-zero block, as found on a blank card.
    #[must_use]
    pub fn blank() -> Self {
        RoomBlock([0; ROOM_BLOCK_SIZE])
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; ROOM_BLOCK_SIZE]) -> Self {
        RoomBlock(bytes)
    }

    /// Encode a room, truncating to the block size.
    #[must_use]
    pub fn encode(room: &RoomId) -> Self {
        let mut bytes = [0; ROOM_BLOCK_SIZE];
        let src = room.as_str().as_bytes();
        let len = src.len().min(ROOM_BLOCK_SIZE);
        bytes[..len].copy_from_slice(&src[..len]);
        RoomBlock(bytes)
    }

    /// Decode the stored room. `None` for a blank block.
    #[must_use]
    pub fn decode(&self) -> Option<RoomId> {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(ROOM_BLOCK_SIZE);
        let text = String::from_utf8_lossy(&self.0[..end]);
        RoomId::new(text.into_owned()).ok()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ROOM_BLOCK_SIZE] {
        &self.0
    }
}

impl Default for RoomBlock {
    fn default() -> Self {
        Self::blank()
    }
}

/// Authenticate the card and read its stored room.
///
/// Does not release the card.
///
/// # Errors
///
/// Returns an error if authentication or the read fails, or if the block
/// holds no room.
pub async fn read_room<T: CardTransceiver>(reader: &mut T, card: &CardPresence) -> Result<RoomId> {
    reader.authenticate(card).await?;
    let block = reader.read_block(card).await?;
    trace!(uid = %card.uid, bytes = ?block.as_bytes(), "Read room block");
    block
        .decode()
        .ok_or_else(|| HardwareError::card_read(format!("card {} holds no room", card.uid)))
}

/// Authenticate the card and write a room into it.
///
/// Does not release the card.
///
/// # Errors
///
/// Returns an error if authentication or the write fails.
pub async fn write_room<T: CardTransceiver>(
    reader: &mut T,
    card: &CardPresence,
    room: &RoomId,
) -> Result<()> {
    reader.authenticate(card).await?;
    reader.write_block(card, &RoomBlock::encode(room)).await
}
