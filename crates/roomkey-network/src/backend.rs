//! Backend trait definition.
//!
//! The terminal depends only on this trait; [`HttpBackend`](crate::HttpBackend)
//! speaks the real HTTP routes and [`MockBackend`](crate::MockBackend) scripts
//! replies for tests.

#![allow(async_fn_in_trait)]

use roomkey_core::{ReaderId, RoomId};

use crate::error::Result;
use crate::wire::{CardReadEvent, ConfirmWriteRequest, InspectionReport, PendingWrite};

/// Remote backend consulted by the terminal.
///
/// Every call is a single request/response. Implementations do not retry;
/// the terminal polls again on its next cycle.
///
/// # Object Safety
///
/// Uses native `async fn`, so the trait is not object-safe. Use generics:
///
/// ```no_run
/// use roomkey_core::ReaderId;
/// use roomkey_network::{Backend, Result};
///
/// async fn print_room<B: Backend>(backend: &B, reader: &ReaderId) -> Result<()> {
///     if let Some(room) = backend.reader_room(reader).await? {
///         println!("assigned to {room}");
///     }
///     Ok(())
/// }
/// ```
pub trait Backend: Send + Sync {
    /// Room currently assigned to the reader. `None` when the backend has no
    /// usable assignment (absent or blank).
    ///
    /// # Errors
    ///
    /// Transport or parse failure.
    async fn reader_room(&self, reader: &ReaderId) -> Result<Option<RoomId>>;

    /// Whether an operator asked to inspect the next presented card.
    ///
    /// # Errors
    ///
    /// Transport or parse failure (including a missing `pending` field).
    async fn pending_inspection(&self) -> Result<bool>;

    /// Report the outcome of an inspection.
    ///
    /// # Errors
    ///
    /// Transport failure.
    async fn confirm_inspection(&self, report: &InspectionReport) -> Result<()>;

    /// Submit a Verify-mode card read and return the backend's verdict.
    ///
    /// # Errors
    ///
    /// Transport or parse failure. Callers must treat any error as a denial.
    async fn submit_card_read(&self, event: &CardReadEvent) -> Result<bool>;

    /// Whether a write is pending for the given room.
    ///
    /// # Errors
    ///
    /// Transport or parse failure.
    async fn pending_write(&self, room: &RoomId) -> Result<bool>;

    /// Whether a write is pending for any room, and which.
    ///
    /// # Errors
    ///
    /// Transport or parse failure.
    async fn any_pending_write(&self) -> Result<PendingWrite>;

    /// Report the outcome of a provisioning write.
    ///
    /// # Errors
    ///
    /// Transport failure.
    async fn confirm_write(&self, request: &ConfirmWriteRequest) -> Result<()>;
}
