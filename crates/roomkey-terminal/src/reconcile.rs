//! Pending-write reconciler.
//!
//! Keeps the Provision target in step with the writes the backend declares.
//! The device state selects exactly one query per run:
//!
//! | State | Query | Reply | Outcome |
//! |-------|-------|-------|---------|
//! | Verify | pending write for assigned room | pending | [`Arm`](ReconcileOutcome::Arm) |
//! | Provision, target T | pending write for T | not pending | [`Cancel`](ReconcileOutcome::Cancel) |
//! | Provision, no target | any pending write | pending with room R | [`Claim`](ReconcileOutcome::Claim) |
//!
//! Every other reply is [`NoChange`](ReconcileOutcome::NoChange). No outcome
//! both clears and sets a target.

use roomkey_core::RoomId;
use roomkey_network::{Backend, BackendError};
use tracing::{debug, info};

use crate::error::Result;
use crate::state_machine::{DeviceMode, ModeTransition, StateMachine};

/// The single backend query made by a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileQuery {
    /// Verify mode: is a write pending for the assigned room?
    ForAssignedRoom(RoomId),
    /// Provision with a target: is that write still pending?
    StillPending(RoomId),
    /// Provision without a target: is any write pending?
    AnyRoom,
}

impl ReconcileQuery {
    /// Select the query for the current device state.
    #[must_use]
    pub fn for_state(machine: &StateMachine) -> Self {
        match machine.mode() {
            DeviceMode::Verify => Self::ForAssignedRoom(machine.assigned_room().clone()),
            DeviceMode::Provision {
                target: Some(target),
            } => Self::StillPending(target.room.clone()),
            DeviceMode::Provision { target: None } => Self::AnyRoom,
        }
    }

    /// Issue the query and map the reply to an outcome.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the caller keeps the current state.
    pub async fn run<B: Backend>(self, backend: &B) -> std::result::Result<ReconcileOutcome, BackendError> {
        let outcome = match self {
            Self::ForAssignedRoom(room) => {
                if backend.pending_write(&room).await? {
                    ReconcileOutcome::Arm(room)
                } else {
                    ReconcileOutcome::NoChange
                }
            }
            Self::StillPending(room) => {
                if backend.pending_write(&room).await? {
                    ReconcileOutcome::NoChange
                } else {
                    ReconcileOutcome::Cancel(room)
                }
            }
            Self::AnyRoom => backend
                .any_pending_write()
                .await?
                .claimable_room()
                .cloned()
                .map_or(ReconcileOutcome::NoChange, ReconcileOutcome::Claim),
        };
        Ok(outcome)
    }
}

/// What a reconciliation run decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Enter Provision for the assigned room.
    Arm(RoomId),
    /// The active target was withdrawn: return to Verify.
    Cancel(RoomId),
    /// Adopt a room from the generic query, staying in Provision.
    Claim(RoomId),
    NoChange,
}

impl ReconcileOutcome {
    /// Apply the outcome to the state machine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the state changed since the query
    /// was selected.
    pub fn apply(self, machine: &mut StateMachine) -> Result<Option<ModeTransition>> {
        let transition = match self {
            Self::Arm(room) => {
                info!(%room, "Server requested write for our room");
                Some(machine.arm_for_assigned_room()?)
            }
            Self::Cancel(room) => {
                info!(%room, "Write task cancelled by server");
                Some(machine.cancel_target()?)
            }
            Self::Claim(room) => {
                info!(%room, "Generic write requested");
                Some(machine.claim_target(room)?)
            }
            Self::NoChange => None,
        };
        Ok(transition)
    }
}

/// Run one reconciliation: one backend call, at most one transition.
///
/// # Errors
///
/// Returns the backend failure (state untouched) or an invalid transition.
pub async fn reconcile_pending_write<B: Backend>(
    backend: &B,
    machine: &mut StateMachine,
) -> Result<ReconcileOutcome> {
    let query = ReconcileQuery::for_state(machine);
    debug!(?query, "Reconciling pending write");
    let outcome = query.run(backend).await?;
    outcome.clone().apply(machine)?;
    Ok(outcome)
}
