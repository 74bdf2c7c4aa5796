//! Core constants for the room reader terminal.
//!
//! Poll cadences, debounce window and card memory geometry shared by the
//! hardware, network and terminal crates. Values match the shipped reader
//! firmware; the terminal configuration can override the timing ones.
//!
//! ```
//! use roomkey_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(ROOM_BLOCK_SIZE, 16);
//! let cooldown = Duration::from_millis(DEFAULT_DEBOUNCE_MS);
//! assert_eq!(cooldown.as_secs(), 2);
//! ```

// ============================================================================
// Card Memory Layout
// ============================================================================

/// Size in bytes of the card storage block that holds the room id.
pub const ROOM_BLOCK_SIZE: usize = 16;

/// Block address of the room block (sector 1, first data block).
pub const ROOM_BLOCK_ADDRESS: u8 = 4;

/// Default key A used to authenticate the room sector.
pub const DEFAULT_SECTOR_KEY: [u8; 6] = [0xFF; 6];

/// Minimum card UID length in bytes (ISO 14443 single size).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum card UID length in bytes (ISO 14443 triple size).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Timing
// ============================================================================

/// Cooldown during which the same card is not re-evaluated for access.
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// Period of the reader room sync poll.
pub const DEFAULT_CONFIG_SYNC_INTERVAL_MS: u64 = 3000;

/// Period of the pending-write reconciliation poll.
pub const DEFAULT_PENDING_WRITE_INTERVAL_MS: u64 = 2000;

/// Period of the card inspection poll.
pub const DEFAULT_INSPECTION_INTERVAL_MS: u64 = 2000;

/// Period of the heartbeat diagnostic line.
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 5000;

/// Upper bound on any single backend call.
pub const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 3000;

/// Sleep between iterations of the control loop.
pub const DEFAULT_LOOP_INTERVAL_MS: u64 = 50;

// ============================================================================
// Identity
// ============================================================================

/// Reader identity used when none is configured.
pub const DEFAULT_READER_ID: &str = "reader-1";

/// Room assigned at boot until the backend says otherwise.
pub const DEFAULT_ROOM_ID: &str = "101";

/// Backend base URL used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "http://192.168.1.100:3000";

/// Timestamp submitted when no wall clock is available.
pub const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00Z";
