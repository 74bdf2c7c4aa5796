//! Remote config sync: keeps the assigned room in step with the backend.

use roomkey_core::{ReaderId, RoomId};
use roomkey_network::{Backend, BackendError};
use tracing::{debug, info, warn};

use crate::state_machine::{RoomUpdate, StateMachine};

/// Result of one sync poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The backend assigned a different room, now in effect.
    Adopted { room: RoomId, update: RoomUpdate },
    /// The backend agrees with the current room.
    Unchanged,
    /// The backend returned no usable room; nothing changed.
    NoAssignment,
    /// The call failed; nothing changed.
    Failed(BackendError),
}

/// Fetch this reader's room and adopt it if it is non-empty and different.
pub async fn sync_assigned_room<B: Backend>(
    backend: &B,
    reader: &ReaderId,
    machine: &mut StateMachine,
) -> SyncOutcome {
    let room = match backend.reader_room(reader).await {
        Ok(Some(room)) => room,
        Ok(None) => {
            debug!(%reader, "Backend has no room for this reader");
            return SyncOutcome::NoAssignment;
        }
        Err(e) => {
            warn!(%reader, error = %e, "Room sync failed");
            return SyncOutcome::Failed(e);
        }
    };

    match machine.set_assigned_room(room.clone()) {
        RoomUpdate::Unchanged => SyncOutcome::Unchanged,
        update => {
            info!(%room, "Remote room set");
            SyncOutcome::Adopted { room, update }
        }
    }
}
