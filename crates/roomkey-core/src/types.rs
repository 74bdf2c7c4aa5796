use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Room identifier.
///
/// Opaque and non-empty. Two rooms are equal only on an exact string match;
/// the only normalization applied anywhere is trimming of payloads received
/// from the backend or typed by an operator (see [`RoomId::trimmed`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Create a room id from an exact value.
    ///
    /// # Errors
    /// Returns `Error::InvalidRoomId` if the value is empty.
    pub fn new(room: impl Into<String>) -> Result<Self> {
        let room = room.into();
        if room.is_empty() {
            return Err(Error::InvalidRoomId("room id must not be empty".to_string()));
        }
        Ok(RoomId(room))
    }

    /// Create a room id from untrusted input, trimming surrounding whitespace.
    ///
    /// # Errors
    /// Returns `Error::InvalidRoomId` if nothing is left after trimming.
    pub fn trimmed(raw: &str) -> Result<Self> {
        RoomId::new(raw.trim())
    }

    /// Get the room id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RoomId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RoomId::trimmed(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        RoomId::new(value)
    }
}

impl From<RoomId> for String {
    fn from(room: RoomId) -> Self {
        room.0
    }
}

/// Reader identity used by the backend to look up this terminal's room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReaderId(String);

impl ReaderId {
    /// Create a reader id.
    ///
    /// # Errors
    /// Returns `Error::InvalidReaderId` if the id is blank.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidReaderId("reader id must not be empty".to_string()));
        }
        Ok(ReaderId(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReaderId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Card UID as a lowercase hexadecimal string.
///
/// Derived from the card's fixed hardware identifier, two hex digits per
/// byte. Used for logging and audit only, never for the access decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardUid(String);

impl CardUid {
    /// Render raw UID bytes as lowercase hex.
    ///
    /// ```
    /// use roomkey_core::CardUid;
    ///
    /// let uid = CardUid::from_bytes(&[0x04, 0xAB, 0x0C, 0xEF]);
    /// assert_eq!(uid.as_str(), "04ab0cef");
    /// ```
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        CardUid(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Parse a hex string (any case) into a UID.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if the string is not an even number of
    /// hex digits or the decoded length is outside 4-10 bytes.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let bytes = decode_hex(hex.trim())?;
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidCardUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(CardUid::from_bytes(&bytes))
    }

    /// Decode the UID back into raw bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        // Constructed only from valid hex, so decoding cannot fail.
        decode_hex(&self.0).unwrap_or_default()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardUid::from_hex(s)
    }
}

fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(Error::InvalidCardUid(format!("odd or non-ASCII hex: {hex}")));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::InvalidCardUid(format!("invalid hex: {hex}")))
        })
        .collect()
}

/// Wall-clock time attached to a card read event.
///
/// Rendered as ISO-8601 UTC with second precision (`YYYY-MM-DDTHH:MM:SSZ`).
/// When the terminal has no time source the Unix epoch is used instead of
/// failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTimestamp(DateTime<Utc>);

impl EventTimestamp {
    /// Timestamp for the current instant.
    #[must_use]
    pub fn now() -> Self {
        EventTimestamp(Utc::now())
    }

    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        EventTimestamp(dt)
    }

    /// The Unix epoch, submitted when no time source is available.
    #[must_use]
    pub fn epoch() -> Self {
        EventTimestamp(Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }

    /// Use the given wall-clock reading, or fall back to the epoch.
    #[must_use]
    pub fn from_wall_clock(reading: Option<DateTime<Utc>>) -> Self {
        reading.map_or_else(Self::epoch, Self::from_datetime)
    }

    /// Format as `YYYY-MM-DDTHH:MM:SSZ`.
    #[must_use]
    pub fn format(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    #[must_use]
    pub fn inner(&self) -> &DateTime<Utc> {
        &self.0
    }
}

impl fmt::Display for EventTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

impl Serialize for EventTimestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.format())
    }
}
