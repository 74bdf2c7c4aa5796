//! HTTP backend client.
//!
//! Talks JSON over plain HTTP to the routes under `/api/nfc/` of the
//! configured server. Each call is one request with a client-wide timeout;
//! there is no retry and no connection state beyond what `reqwest` pools.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use roomkey_core::ReaderId;
//! use roomkey_network::{Backend, HttpBackend, HttpBackendConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = HttpBackend::new(HttpBackendConfig {
//!     base_url: "http://192.168.1.100:3000".to_string(),
//!     timeout: Duration::from_millis(3000),
//! })?;
//!
//! let room = backend.reader_room(&ReaderId::new("reader-1")?).await?;
//! println!("assigned room: {room:?}");
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::{Client, Response, Url};
use roomkey_core::constants::{DEFAULT_BACKEND_TIMEOUT_MS, DEFAULT_SERVER_URL};
use roomkey_core::{ReaderId, RoomId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};

use crate::backend::Backend;
use crate::error::{BackendError, BackendOperation, Result};
use crate::wire::{
    AnyPendingWriteResponse, CardReadEvent, CardReadResponse, ConfirmWriteRequest,
    InspectionReport, PendingResponse, PendingWrite, ReaderConfigResponse,
};

/// Configuration for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Server base URL, e.g. `http://192.168.1.100:3000`.
    pub base_url: String,

    /// Upper bound for each request, connect included.
    pub timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVER_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_BACKEND_TIMEOUT_MS),
        }
    }
}

/// [`Backend`] implementation over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a client for the given server.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Client` if the base URL is not an absolute
    /// http(s) URL or the HTTP client cannot be built.
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| BackendError::Client(format!("invalid server URL {}: {e}", config.base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(BackendError::Client(format!(
                "server URL must be http(s): {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        debug!(%base_url, timeout_ms = config.timeout.as_millis() as u64, "HTTP backend ready");
        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/api/nfc/{segments...}`. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| BackendError::Client(format!("cannot-be-a-base URL: {}", self.base_url)))?;
            path.pop_if_empty()
                .extend(["api", "nfc"].into_iter().chain(segments.iter().copied()));
        }
        Ok(url)
    }

    fn map_reqwest(&self, operation: BackendOperation, error: &reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::timeout(operation, self.timeout.as_millis() as u64)
        } else {
            BackendError::transport(operation, error.to_string())
        }
    }

    fn check_status(operation: BackendOperation, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            warn!(%operation, status = status.as_u16(), "Backend returned error status");
            Err(BackendError::Status {
                operation,
                status: status.as_u16(),
            })
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        operation: BackendOperation,
        response: Response,
    ) -> Result<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest(operation, &e))?;
        trace!(%operation, body = %String::from_utf8_lossy(&body), "Backend response");
        serde_json::from_slice(&body).map_err(|e| BackendError::parse(operation, e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: BackendOperation, url: Url) -> Result<T> {
        trace!(%operation, %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest(operation, &e))?;
        let response = Self::check_status(operation, response)?;
        self.read_json(operation, response).await
    }

    async fn post_json<B: Serialize>(
        &self,
        operation: BackendOperation,
        url: Url,
        body: &B,
    ) -> Result<Response> {
        trace!(%operation, %url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_reqwest(operation, &e))?;
        Self::check_status(operation, response)
    }
}

impl Backend for HttpBackend {
    async fn reader_room(&self, reader: &ReaderId) -> Result<Option<RoomId>> {
        let url = self.endpoint(&["reader-config", reader.as_str()])?;
        let response: ReaderConfigResponse =
            self.get_json(BackendOperation::ReaderRoom, url).await?;
        Ok(response.room())
    }

    async fn pending_inspection(&self) -> Result<bool> {
        let url = self.endpoint(&["inspect-card", "pending"])?;
        let response: PendingResponse = self
            .get_json(BackendOperation::PendingInspection, url)
            .await?;
        Ok(response.pending)
    }

    async fn confirm_inspection(&self, report: &InspectionReport) -> Result<()> {
        let url = self.endpoint(&["inspect-card", "confirm"])?;
        self.post_json(BackendOperation::ConfirmInspection, url, report)
            .await?;
        Ok(())
    }

    async fn submit_card_read(&self, event: &CardReadEvent) -> Result<bool> {
        let url = self.endpoint(&["read"])?;
        let response = self
            .post_json(BackendOperation::SubmitCardRead, url, event)
            .await?;
        let verdict: CardReadResponse = self
            .read_json(BackendOperation::SubmitCardRead, response)
            .await?;
        Ok(verdict.door_allowed)
    }

    async fn pending_write(&self, room: &RoomId) -> Result<bool> {
        let url = self.endpoint(&["pending-write", room.as_str()])?;
        let response: PendingResponse = self.get_json(BackendOperation::PendingWrite, url).await?;
        Ok(response.pending)
    }

    async fn any_pending_write(&self) -> Result<PendingWrite> {
        let url = self.endpoint(&["any-pending-write"])?;
        let response: AnyPendingWriteResponse = self
            .get_json(BackendOperation::AnyPendingWrite, url)
            .await?;
        Ok(response.into())
    }

    async fn confirm_write(&self, request: &ConfirmWriteRequest) -> Result<()> {
        let url = self.endpoint(&["confirm-write"])?;
        self.post_json(BackendOperation::ConfirmWrite, url, request)
            .await?;
        Ok(())
    }
}
