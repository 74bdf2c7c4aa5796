//! JSON payloads exchanged with the backend.
//!
//! Field names follow the backend routes (`roomId`/`cardUid` camel case, the
//! card read event in snake case).

use roomkey_core::{CardUid, EventTimestamp, RoomId};
use serde::{Deserialize, Serialize};

/// `GET /api/nfc/reader-config/{readerId}` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReaderConfigResponse {
    #[serde(rename = "roomId", default)]
    pub room_id: Option<String>,
}

impl ReaderConfigResponse {
    /// The assigned room, trimmed. `None` when absent or blank.
    #[must_use]
    pub fn room(&self) -> Option<RoomId> {
        self.room_id.as_deref().and_then(|raw| RoomId::trimmed(raw).ok())
    }
}

/// Response of the boolean "pending" queries.
///
/// The `pending` field is required: a body without it is malformed, never
/// read as "not pending".
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PendingResponse {
    pub pending: bool,
}

/// `GET /api/nfc/any-pending-write` response.
#[derive(Debug, Clone, Deserialize)]
pub struct AnyPendingWriteResponse {
    pub pending: bool,
    #[serde(rename = "roomId", default)]
    pub room_id: Option<String>,
}

/// Outcome of the generic write-pending query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingWrite {
    pub pending: bool,
    pub room: Option<RoomId>,
}

impl PendingWrite {
    /// Nothing pending.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// A pending write for the given room.
    #[must_use]
    pub fn for_room(room: RoomId) -> Self {
        Self {
            pending: true,
            room: Some(room),
        }
    }

    /// The room to claim, if a write is pending and names one.
    #[must_use]
    pub fn claimable_room(&self) -> Option<&RoomId> {
        if self.pending { self.room.as_ref() } else { None }
    }
}

impl From<AnyPendingWriteResponse> for PendingWrite {
    fn from(response: AnyPendingWriteResponse) -> Self {
        Self {
            pending: response.pending,
            room: response
                .room_id
                .as_deref()
                .and_then(|raw| RoomId::trimmed(raw).ok()),
        }
    }
}

/// `POST /api/nfc/read` body: a card read in Verify mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardReadEvent {
    #[serde(rename = "room_id")]
    pub room: RoomId,
    #[serde(rename = "card_uid")]
    pub uid: CardUid,
    pub timestamp: EventTimestamp,
}

/// `POST /api/nfc/read` response.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CardReadResponse {
    #[serde(rename = "doorAllowed", default)]
    pub door_allowed: bool,
}

/// `POST /api/nfc/inspect-card/confirm` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionReport {
    pub success: bool,
    #[serde(rename = "roomId", skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomId>,
    #[serde(rename = "cardUid")]
    pub uid: CardUid,
}

impl InspectionReport {
    /// The card was read and holds `room`.
    #[must_use]
    pub fn found(room: RoomId, uid: CardUid) -> Self {
        Self {
            success: true,
            room: Some(room),
            uid,
        }
    }

    /// The card could not be read or holds no room.
    #[must_use]
    pub fn unreadable(uid: CardUid) -> Self {
        Self {
            success: false,
            room: None,
            uid,
        }
    }
}

/// `POST /api/nfc/confirm-write` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmWriteRequest {
    #[serde(rename = "roomId")]
    pub room: RoomId,
    pub success: bool,
}
