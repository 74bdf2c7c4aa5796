//! Access decision engine.
//!
//! Two stages, both of which must pass:
//!
//! 1. The room stored on the card must equal the assigned room. This check
//!    is local; a mismatch (or an unreadable card) is denied without
//!    contacting the backend.
//! 2. The backend must allow the read. Any failure of that call denies.

use std::fmt;

use roomkey_core::{EventTimestamp, RoomId};
use roomkey_hardware::{CardPresence, CardTransceiver, read_room};
use roomkey_network::{Backend, CardReadEvent};
use tracing::{info, warn};

use crate::clock::TimeSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// The card holds another room, or could not be read.
    RoomMismatch,
    /// The backend refused the card or could not be reached.
    NotAuthorized,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoomMismatch => write!(f, "room mismatch"),
            Self::NotAuthorized => write!(f, "not authorized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessDecision {
    Granted,
    Denied(DenyReason),
}

impl AccessDecision {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Decide access for a presented card.
///
/// Does not release the card.
pub async fn decide_access<T, B, C>(
    reader: &mut T,
    backend: &B,
    clock: &C,
    card: &CardPresence,
    assigned_room: &RoomId,
) -> AccessDecision
where
    T: CardTransceiver,
    B: Backend,
    C: TimeSource + ?Sized,
{
    match read_room(reader, card).await {
        Ok(card_room) if &card_room == assigned_room => {
            info!(uid = %card.uid, room = %card_room, "Card scanned");
        }
        Ok(card_room) => {
            info!(uid = %card.uid, card_room = %card_room, room = %assigned_room, "Access denied: room mismatch");
            return AccessDecision::Denied(DenyReason::RoomMismatch);
        }
        Err(e) => {
            info!(uid = %card.uid, error = %e, "Access denied: card unreadable");
            return AccessDecision::Denied(DenyReason::RoomMismatch);
        }
    }

    let event = CardReadEvent {
        room: assigned_room.clone(),
        uid: card.uid.clone(),
        timestamp: EventTimestamp::from_wall_clock(clock.now()),
    };
    match backend.submit_card_read(&event).await {
        Ok(true) => {
            info!(uid = %card.uid, room = %assigned_room, "Access granted");
            AccessDecision::Granted
        }
        Ok(false) => {
            info!(uid = %card.uid, "Access denied: backend policy rejected card");
            AccessDecision::Denied(DenyReason::NotAuthorized)
        }
        Err(e) => {
            warn!(uid = %card.uid, error = %e, "Access denied: authorization unavailable");
            AccessDecision::Denied(DenyReason::NotAuthorized)
        }
    }
}
