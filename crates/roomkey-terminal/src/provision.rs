//! Provision (write) workflow.
//!
//! One write attempt per presentation. The outcome is always reported, and
//! the device always returns to Verify afterwards; the reconciler re-arms
//! Provision if more writes are pending.

use roomkey_core::RoomId;
use roomkey_hardware::{CardPresence, CardTransceiver, write_room};
use roomkey_network::{Backend, ConfirmWriteRequest};
use tracing::{info, warn};

use crate::state_machine::StateMachine;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The room was written to the card.
    Written(RoomId),
    /// The write failed.
    Failed(RoomId),
    /// Provision mode without a target: the card was not touched.
    NoTarget,
}

/// Write the target room to the presented card and report the outcome.
///
/// Does not release the card.
pub async fn provision_card<T: CardTransceiver, B: Backend>(
    reader: &mut T,
    backend: &B,
    machine: &mut StateMachine,
    card: &CardPresence,
) -> ProvisionOutcome {
    let Some(room) = machine.write_target().cloned() else {
        warn!(uid = %card.uid, "Card tapped in Provision mode but no room assigned");
        return ProvisionOutcome::NoTarget;
    };

    let success = match write_room(reader, card, &room).await {
        Ok(()) => {
            info!(uid = %card.uid, %room, "Card programmed");
            true
        }
        Err(e) => {
            warn!(uid = %card.uid, %room, error = %e, "Card write failed");
            false
        }
    };

    let request = ConfirmWriteRequest {
        room: room.clone(),
        success,
    };
    if let Err(e) = backend.confirm_write(&request).await {
        warn!(%room, success, error = %e, "Write result not delivered");
    }

    if let Err(e) = machine.complete_write() {
        warn!(error = %e, "Could not leave Provision mode");
    }

    if success {
        ProvisionOutcome::Written(room)
    } else {
        ProvisionOutcome::Failed(room)
    }
}
