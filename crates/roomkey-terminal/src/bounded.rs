//! Time-bounded backend wrapper.
//!
//! Backend calls block the control loop, so every call is bounded. Expiry is
//! reported as [`BackendError::Timeout`] and handled like any transport
//! failure by the caller.

use std::future::Future;
use std::time::Duration;

use roomkey_core::{ReaderId, RoomId};
use roomkey_network::{
    Backend, BackendError, BackendOperation, CardReadEvent, ConfirmWriteRequest,
    InspectionReport, PendingWrite, Result,
};
use tracing::warn;

/// Wraps a [`Backend`] so that no call outlives `limit`.
#[derive(Debug, Clone)]
pub struct BoundedBackend<B> {
    inner: B,
    limit: Duration,
}

impl<B: Backend> BoundedBackend<B> {
    pub fn new(inner: B, limit: Duration) -> Self {
        Self { inner, limit }
    }

    #[must_use]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    #[must_use]
    pub fn limit(&self) -> Duration {
        self.limit
    }

    async fn bounded<T>(
        &self,
        operation: BackendOperation,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.limit.as_millis()).unwrap_or(u64::MAX);
                warn!(%operation, timeout_ms, "Backend call timed out");
                Err(BackendError::timeout(operation, timeout_ms))
            }
        }
    }
}

impl<B: Backend> Backend for BoundedBackend<B> {
    async fn reader_room(&self, reader: &ReaderId) -> Result<Option<RoomId>> {
        self.bounded(BackendOperation::ReaderRoom, self.inner.reader_room(reader))
            .await
    }

    async fn pending_inspection(&self) -> Result<bool> {
        self.bounded(
            BackendOperation::PendingInspection,
            self.inner.pending_inspection(),
        )
        .await
    }

    async fn confirm_inspection(&self, report: &InspectionReport) -> Result<()> {
        self.bounded(
            BackendOperation::ConfirmInspection,
            self.inner.confirm_inspection(report),
        )
        .await
    }

    async fn submit_card_read(&self, event: &CardReadEvent) -> Result<bool> {
        self.bounded(
            BackendOperation::SubmitCardRead,
            self.inner.submit_card_read(event),
        )
        .await
    }

    async fn pending_write(&self, room: &RoomId) -> Result<bool> {
        self.bounded(BackendOperation::PendingWrite, self.inner.pending_write(room))
            .await
    }

    async fn any_pending_write(&self) -> Result<PendingWrite> {
        self.bounded(
            BackendOperation::AnyPendingWrite,
            self.inner.any_pending_write(),
        )
        .await
    }

    async fn confirm_write(&self, request: &ConfirmWriteRequest) -> Result<()> {
        self.bounded(
            BackendOperation::ConfirmWrite,
            self.inner.confirm_write(request),
        )
        .await
    }
}
