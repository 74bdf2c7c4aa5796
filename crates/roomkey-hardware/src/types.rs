//! Common types shared by transceiver implementations.

use roomkey_core::constants::{MAX_UID_LENGTH, MIN_UID_LENGTH};
use roomkey_core::{CardUid, RoomId};
use serde::{Deserialize, Serialize};

use crate::error::{HardwareError, Result};

/// Card currently in the reader's field.
///
/// Carries the raw UID used to address the chip and its lowercase hex
/// rendering used for logging and backend reports. Only one card is ever in
/// range at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardPresence {
    /// Raw card UID (4-10 bytes).
    pub uid_bytes: Vec<u8>,

    /// Lowercase hex rendering of `uid_bytes`.
    pub uid: CardUid,

    /// When the card was detected.
    pub detected_at: chrono::DateTime<chrono::Utc>,
}

impl CardPresence {
    /// Create a presence record for the given UID.
    ///
    /// # Errors
    ///
    /// Returns an error if the UID length is outside the ISO 14443 range.
    ///
    /// # Examples
    ///
    /// ```
    /// use roomkey_hardware::CardPresence;
    ///
    /// let card = CardPresence::new(vec![0x04, 0xAB, 0xCD, 0xEF]).unwrap();
    /// assert_eq!(card.uid.as_str(), "04abcdef");
    /// assert!(CardPresence::new(vec![0x01]).is_err());
    /// ```
    pub fn new(uid_bytes: Vec<u8>) -> Result<Self> {
        let len = uid_bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(HardwareError::invalid_data(format!(
                "Card UID length must be between {MIN_UID_LENGTH} and {MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(Self {
            uid: CardUid::from_bytes(&uid_bytes),
            uid_bytes,
            detected_at: chrono::Utc::now(),
        })
    }
}

/// Input from the terminal's local controls.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LocalInput {
    /// Momentary mode button press: flips Verify/Provision.
    ToggleMode,

    /// Operator override of the assigned room, for diagnostics.
    ///
    /// Raw text as typed; the terminal trims it and ignores blank input.
    SetRoom(String),
}

impl LocalInput {
    /// The room requested by a `SetRoom` input, if it is not blank.
    #[must_use]
    pub fn requested_room(&self) -> Option<RoomId> {
        match self {
            Self::SetRoom(raw) => RoomId::trimmed(raw).ok(),
            _ => None,
        }
    }
}

/// Transceiver information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "RC522").
    pub name: String,

    /// Supported protocols (e.g., ["ISO14443A"]).
    pub protocols: Vec<String>,
}

impl ReaderInfo {
    pub fn new(name: impl Into<String>, protocols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            protocols,
        }
    }
}
