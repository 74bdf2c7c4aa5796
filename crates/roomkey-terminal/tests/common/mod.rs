//! Common fixtures for terminal integration tests.
//!
//! A [`Rig`] wires a [`Terminal`] to a mock transceiver and a mock backend.
//! Tests run on paused tokio time: [`Rig::advance`] moves the clock and runs
//! one tick, so poller deadlines, display holds and the debounce cooldown are
//! all deterministic.
//!
//! After [`Rig::new`] the first tick has already run (every poller fires on
//! it) and the backend call log is cleared. From there the default schedule
//! is:
//!
//! | Elapsed | Pollers due |
//! |---------|-------------|
//! | 2000 ms | pending write, inspection |
//! | 3000 ms | config sync |
//! | 4000 ms | pending write, inspection |
//! | 5000 ms | heartbeat |

#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use roomkey_core::RoomId;
use roomkey_hardware::mock::{MockTransceiver, MockTransceiverHandle};
use roomkey_network::MockBackend;
use roomkey_terminal::{FixedTimeSource, PresentationOutcome, Terminal, TerminalConfig, TickReport};

/// Test data shared across scenarios.
pub mod test_data {
    /// Guest card holding the assigned room.
    pub const GUEST_CARD: [u8; 4] = [0x04, 0xA1, 0xB2, 0xC3];

    /// Card holding another room.
    pub const OTHER_ROOM_CARD: [u8; 4] = [0x04, 0x10, 0x20, 0x30];

    /// Card with an empty room block.
    pub const BLANK_CARD: [u8; 7] = [0x04, 0x5A, 0x6B, 0x7C, 0x8D, 0x9E, 0x01];

    pub const ASSIGNED_ROOM: &str = "101";
    pub const OTHER_ROOM: &str = "102";
    pub const CLAIMED_ROOM: &str = "305";
}

pub fn room(id: &str) -> RoomId {
    RoomId::new(id).unwrap()
}

pub fn wall_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 27, 14, 30, 0).unwrap()
}

pub struct Rig {
    pub terminal: Terminal<MockTransceiver, MockBackend>,
    pub cards: MockTransceiverHandle,
    pub backend: MockBackend,
}

impl Rig {
    /// Default configuration, assigned room 101 on both sides.
    pub async fn new() -> Self {
        Self::with_config(TerminalConfig::default()).await
    }

    pub async fn with_config(config: TerminalConfig) -> Self {
        use test_data::*;

        let (reader, cards) = MockTransceiver::new();
        cards.add_card(GUEST_CARD.to_vec(), Some(room(ASSIGNED_ROOM)));
        cards.add_card(OTHER_ROOM_CARD.to_vec(), Some(room(OTHER_ROOM)));
        cards.add_card(BLANK_CARD.to_vec(), None);

        let backend = MockBackend::new();
        backend.set_reader_room(Some(room(ASSIGNED_ROOM)));

        let mut terminal = Terminal::new(&config, reader, backend.clone())
            .unwrap()
            .with_clock(FixedTimeSource(Some(wall_clock())));
        terminal.tick().await;
        backend.clear_calls();

        Self {
            terminal,
            cards,
            backend,
        }
    }

    /// Present a card and run one tick.
    pub async fn tap(&mut self, uid: &[u8]) -> PresentationOutcome {
        self.cards.present_card(uid.to_vec()).await.unwrap();
        self.terminal
            .tick()
            .await
            .presentation
            .expect("presented card was not handled")
    }

    /// Move the clock forward and run one tick.
    pub async fn advance(&mut self, duration: Duration) -> TickReport {
        tokio::time::advance(duration).await;
        self.terminal.tick().await
    }

    pub async fn advance_ms(&mut self, ms: u64) -> TickReport {
        self.advance(Duration::from_millis(ms)).await
    }
}
