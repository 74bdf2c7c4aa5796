//! Backend communication layer for the room reader terminal.
//!
//! The terminal never builds URLs or parses JSON itself. It calls the
//! [`Backend`] trait, which covers the seven backend operations:
//!
//! | Operation | Route |
//! |-----------|-------|
//! | [`reader_room`](Backend::reader_room) | `GET /api/nfc/reader-config/{readerId}` |
//! | [`pending_inspection`](Backend::pending_inspection) | `GET /api/nfc/inspect-card/pending` |
//! | [`confirm_inspection`](Backend::confirm_inspection) | `POST /api/nfc/inspect-card/confirm` |
//! | [`submit_card_read`](Backend::submit_card_read) | `POST /api/nfc/read` |
//! | [`pending_write`](Backend::pending_write) | `GET /api/nfc/pending-write/{roomId}` |
//! | [`any_pending_write`](Backend::any_pending_write) | `GET /api/nfc/any-pending-write` |
//! | [`confirm_write`](Backend::confirm_write) | `POST /api/nfc/confirm-write` |
//!
//! # Components
//!
//! - **HttpBackend**: `reqwest` client speaking the routes above
//! - **MockBackend**: in-memory backend with failure injection, for tests
//!
//! Errors are classified as transport (unreachable, non-2xx, timeout) or
//! parse (malformed body). Neither is fatal; see [`BackendError`].

mod backend;
mod error;
mod http;
mod mock;
mod wire;

pub use backend::Backend;
pub use error::{BackendError, BackendOperation, Result};
pub use http::{HttpBackend, HttpBackendConfig};
pub use mock::{BackendCall, MockBackend};
pub use wire::{
    AnyPendingWriteResponse, CardReadEvent, CardReadResponse, ConfirmWriteRequest,
    InspectionReport, PendingResponse, PendingWrite, ReaderConfigResponse,
};
