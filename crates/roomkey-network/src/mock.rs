//! Mock backend for testing.
//!
//! [`MockBackend`] keeps the backend's view of the world in memory: the
//! reader's assigned room, the inspection flag, authorized cards and the
//! queue of pending writes. Every call is recorded so tests can assert on
//! the exact sequence of requests. Clones share state, so a test keeps one
//! clone as a handle while the terminal owns another.
//!
//! # Example
//!
//! ```
//! use roomkey_core::RoomId;
//! use roomkey_network::{Backend, BackendOperation, MockBackend};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = MockBackend::new();
//! backend.queue_write(RoomId::new("305").unwrap());
//!
//! let pending = backend.any_pending_write().await.unwrap();
//! assert_eq!(pending.claimable_room().map(|r| r.as_str()), Some("305"));
//! assert_eq!(backend.call_count(BackendOperation::AnyPendingWrite), 1);
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use roomkey_core::{CardUid, ReaderId, RoomId};
use tracing::trace;

use crate::backend::Backend;
use crate::error::{BackendError, BackendOperation, Result};
use crate::wire::{CardReadEvent, ConfirmWriteRequest, InspectionReport, PendingWrite};

/// A request received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    ReaderRoom(ReaderId),
    PendingInspection,
    ConfirmInspection(InspectionReport),
    SubmitCardRead(CardReadEvent),
    PendingWrite(RoomId),
    AnyPendingWrite,
    ConfirmWrite(ConfirmWriteRequest),
}

impl BackendCall {
    #[must_use]
    pub fn operation(&self) -> BackendOperation {
        match self {
            Self::ReaderRoom(_) => BackendOperation::ReaderRoom,
            Self::PendingInspection => BackendOperation::PendingInspection,
            Self::ConfirmInspection(_) => BackendOperation::ConfirmInspection,
            Self::SubmitCardRead(_) => BackendOperation::SubmitCardRead,
            Self::PendingWrite(_) => BackendOperation::PendingWrite,
            Self::AnyPendingWrite => BackendOperation::AnyPendingWrite,
            Self::ConfirmWrite(_) => BackendOperation::ConfirmWrite,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    reader_room: Option<RoomId>,
    inspection_pending: bool,
    allowed_cards: HashSet<CardUid>,
    pending_writes: Vec<RoomId>,
    failures: HashMap<BackendOperation, BackendError>,
    latency: Option<Duration>,
    calls: Vec<BackendCall>,
}

/// In-memory [`Backend`] with failure injection and call recording.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set (or clear) the room the backend assigns to the reader.
    pub fn set_reader_room(&self, room: Option<RoomId>) {
        self.lock().reader_room = room;
    }

    /// Raise the inspection flag. It stays up until an inspection is
    /// confirmed.
    pub fn request_inspection(&self) {
        self.lock().inspection_pending = true;
    }

    #[must_use]
    pub fn inspection_requested(&self) -> bool {
        self.lock().inspection_pending
    }

    /// Grant access to a card. Unknown cards are refused.
    pub fn allow_card(&self, uid: CardUid) {
        self.lock().allowed_cards.insert(uid);
    }

    pub fn revoke_card(&self, uid: &CardUid) {
        self.lock().allowed_cards.remove(uid);
    }

    /// Add a pending write for `room`. The oldest pending write is the one
    /// offered by the generic query.
    pub fn queue_write(&self, room: RoomId) {
        let mut state = self.lock();
        if !state.pending_writes.contains(&room) {
            state.pending_writes.push(room);
        }
    }

    /// Withdraw a pending write, as an operator cancelling it would.
    pub fn cancel_write(&self, room: &RoomId) {
        self.lock().pending_writes.retain(|r| r != room);
    }

    #[must_use]
    pub fn pending_writes(&self) -> Vec<RoomId> {
        self.lock().pending_writes.clone()
    }

    /// Make every call of `operation` fail with `error` until cleared.
    pub fn fail(&self, operation: BackendOperation, error: BackendError) {
        self.lock().failures.insert(operation, error);
    }

    /// Make every call of `operation` fail with a transport error.
    pub fn fail_transport(&self, operation: BackendOperation) {
        self.fail(
            operation,
            BackendError::transport(operation, "connection refused"),
        );
    }

    pub fn clear_failure(&self, operation: BackendOperation) {
        self.lock().failures.remove(&operation);
    }

    /// Delay every reply by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    /// All calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn calls_for(&self, operation: BackendOperation) -> Vec<BackendCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn call_count(&self, operation: BackendOperation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Record the call, apply latency and injected failures.
    async fn begin(&self, call: BackendCall) -> Result<()> {
        let operation = call.operation();
        trace!(%operation, "Mock backend call");
        let latency = {
            let mut state = self.lock();
            state.calls.push(call);
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match self.lock().failures.get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

impl Backend for MockBackend {
    async fn reader_room(&self, reader: &ReaderId) -> Result<Option<RoomId>> {
        self.begin(BackendCall::ReaderRoom(reader.clone())).await?;
        Ok(self.lock().reader_room.clone())
    }

    async fn pending_inspection(&self) -> Result<bool> {
        self.begin(BackendCall::PendingInspection).await?;
        Ok(self.lock().inspection_pending)
    }

    async fn confirm_inspection(&self, report: &InspectionReport) -> Result<()> {
        self.begin(BackendCall::ConfirmInspection(report.clone()))
            .await?;
        self.lock().inspection_pending = false;
        Ok(())
    }

    async fn submit_card_read(&self, event: &CardReadEvent) -> Result<bool> {
        self.begin(BackendCall::SubmitCardRead(event.clone())).await?;
        Ok(self.lock().allowed_cards.contains(&event.uid))
    }

    async fn pending_write(&self, room: &RoomId) -> Result<bool> {
        self.begin(BackendCall::PendingWrite(room.clone())).await?;
        Ok(self.lock().pending_writes.contains(room))
    }

    async fn any_pending_write(&self) -> Result<PendingWrite> {
        self.begin(BackendCall::AnyPendingWrite).await?;
        Ok(self
            .lock()
            .pending_writes
            .first()
            .cloned()
            .map_or_else(PendingWrite::none, PendingWrite::for_room))
    }

    async fn confirm_write(&self, request: &ConfirmWriteRequest) -> Result<()> {
        self.begin(BackendCall::ConfirmWrite(request.clone())).await?;
        self.lock().pending_writes.retain(|r| r != &request.room);
        Ok(())
    }
}
