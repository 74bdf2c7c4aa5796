//! Terminal configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! reader_id = "reader-1"
//! room_id = "101"
//! server_url = "http://192.168.1.100:3000"
//!
//! config_sync_interval_ms = 3000
//! pending_write_interval_ms = 2000
//! inspection_interval_ms = 2000
//! heartbeat_interval_ms = 5000
//! debounce_ms = 2000
//! backend_timeout_ms = 3000
//! loop_interval_ms = 50
//! ```

use std::path::Path;
use std::time::Duration;

use roomkey_core::constants::{
    DEFAULT_BACKEND_TIMEOUT_MS, DEFAULT_CONFIG_SYNC_INTERVAL_MS, DEFAULT_DEBOUNCE_MS,
    DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_INSPECTION_INTERVAL_MS, DEFAULT_LOOP_INTERVAL_MS,
    DEFAULT_PENDING_WRITE_INTERVAL_MS, DEFAULT_READER_ID, DEFAULT_ROOM_ID, DEFAULT_SERVER_URL,
};
use roomkey_core::{Error, ReaderId, Result, RoomId};
use serde::{Deserialize, Serialize};

use crate::schedule::{PollSchedule, Poller};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerminalConfig {
    /// Identity used to look up this reader's room.
    pub reader_id: String,

    /// Assigned room until the backend says otherwise.
    pub room_id: String,

    /// Backend base URL.
    pub server_url: String,

    pub config_sync_interval_ms: u64,
    pub pending_write_interval_ms: u64,
    pub inspection_interval_ms: u64,
    pub heartbeat_interval_ms: u64,

    /// Cooldown before the same card is evaluated again.
    pub debounce_ms: u64,

    /// Upper bound for any single backend call.
    pub backend_timeout_ms: u64,

    /// Control loop period.
    pub loop_interval_ms: u64,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            reader_id: DEFAULT_READER_ID.to_string(),
            room_id: DEFAULT_ROOM_ID.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            config_sync_interval_ms: DEFAULT_CONFIG_SYNC_INTERVAL_MS,
            pending_write_interval_ms: DEFAULT_PENDING_WRITE_INTERVAL_MS,
            inspection_interval_ms: DEFAULT_INSPECTION_INTERVAL_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            backend_timeout_ms: DEFAULT_BACKEND_TIMEOUT_MS,
            loop_interval_ms: DEFAULT_LOOP_INTERVAL_MS,
        }
    }
}

impl TerminalConfig {
    /// Load and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, `Error::Config` if it
    /// does not parse or fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Parse and validate TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on a syntax error, an unknown key, or a value
    /// that fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the terminal cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.reader()?;
        self.initial_room()
            .map_err(|_| Error::Config("room_id must not be blank".to_string()))?;

        let url = self.server_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "server_url must start with http:// or https://, got {:?}",
                self.server_url
            )));
        }

        for (name, value) in [
            ("config_sync_interval_ms", self.config_sync_interval_ms),
            ("pending_write_interval_ms", self.pending_write_interval_ms),
            ("inspection_interval_ms", self.inspection_interval_ms),
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("backend_timeout_ms", self.backend_timeout_ms),
            ("loop_interval_ms", self.loop_interval_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidReaderId` if `reader_id` is blank.
    pub fn reader(&self) -> Result<ReaderId> {
        ReaderId::new(self.reader_id.as_str())
    }

    /// # Errors
    ///
    /// Returns `Error::InvalidRoomId` if `room_id` is blank.
    pub fn initial_room(&self) -> Result<RoomId> {
        RoomId::trimmed(&self.room_id)
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    #[must_use]
    pub fn loop_interval(&self) -> Duration {
        Duration::from_millis(self.loop_interval_ms)
    }

    /// Poll schedule built from the interval fields.
    #[must_use]
    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule::new(&[
            (
                Poller::ConfigSync,
                Duration::from_millis(self.config_sync_interval_ms),
            ),
            (
                Poller::PendingWrite,
                Duration::from_millis(self.pending_write_interval_ms),
            ),
            (
                Poller::Inspection,
                Duration::from_millis(self.inspection_interval_ms),
            ),
            (
                Poller::Heartbeat,
                Duration::from_millis(self.heartbeat_interval_ms),
            ),
        ])
    }
}
