//! Card inspection handler.
//!
//! An operator can ask the backend to read back the room stored on the next
//! card presented to this terminal. While the backend's inspection flag is
//! up, the next presentation is intercepted in either mode: the card is
//! read (never written), the result is reported, and the local flag is
//! consumed. Inspection never grants access.

use roomkey_core::RoomId;
use roomkey_hardware::{CardPresence, CardTransceiver, read_room};
use roomkey_network::{Backend, BackendError, InspectionReport};
use tracing::{debug, info, warn};

/// Outcome of inspecting one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectionOutcome {
    /// The card holds this room.
    Found(RoomId),
    /// The card could not be read or holds no room.
    Unreadable,
}

/// Local copy of the backend's inspection flag.
#[derive(Debug, Clone, Default)]
pub struct InspectionHandler {
    pending: bool,
}

impl InspectionHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the next presentation will be inspected.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Poll the backend flag. On failure the local flag is left as is.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn refresh<B: Backend>(&mut self, backend: &B) -> Result<bool, BackendError> {
        let pending = backend.pending_inspection().await?;
        if pending != self.pending {
            debug!(pending, "Inspection flag changed");
        }
        self.pending = pending;
        Ok(pending)
    }

    /// Inspect the presented card and report the result. Consumes the flag
    /// whatever the outcome; a failed report is logged.
    ///
    /// Does not release the card.
    pub async fn inspect<T: CardTransceiver, B: Backend>(
        &mut self,
        reader: &mut T,
        backend: &B,
        card: &CardPresence,
    ) -> InspectionOutcome {
        self.pending = false;

        let (outcome, report) = match read_room(reader, card).await {
            Ok(room) => {
                info!(uid = %card.uid, %room, "Card inspect success");
                (
                    InspectionOutcome::Found(room.clone()),
                    InspectionReport::found(room, card.uid.clone()),
                )
            }
            Err(e) => {
                info!(uid = %card.uid, error = %e, "Card inspect failed");
                (
                    InspectionOutcome::Unreadable,
                    InspectionReport::unreadable(card.uid.clone()),
                )
            }
        };

        if let Err(e) = backend.confirm_inspection(&report).await {
            warn!(uid = %card.uid, error = %e, "Inspection report not delivered");
        }
        outcome
    }
}
