//! Mock card transceiver for testing and development.
//!
//! Simulates an RC522-style reader: cards live in an in-memory store with one
//! room block each, are presented through a handle, and every primitive
//! operation is recorded so tests can assert on card I/O.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use roomkey_core::RoomId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::debug;

use crate::{
    Result,
    error::HardwareError,
    memory::RoomBlock,
    traits::CardTransceiver,
    types::{CardPresence, ReaderInfo},
};

/// A primitive operation performed against a mock card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOperation {
    Authenticate { uid: String },
    Read { uid: String },
    Write { uid: String, block: RoomBlock },
    Release { uid: String },
}

#[derive(Debug, Clone, Default)]
struct MockCard {
    memory: RoomBlock,
    reject_auth: bool,
    fail_writes: bool,
}

#[derive(Debug, Default)]
struct CardStore {
    cards: HashMap<Vec<u8>, MockCard>,
    operations: Vec<CardOperation>,
}

type SharedStore = Arc<Mutex<CardStore>>;

fn lock(store: &SharedStore) -> MutexGuard<'_, CardStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock card transceiver.
///
/// # Examples
///
/// ```
/// use roomkey_core::RoomId;
/// use roomkey_hardware::mock::MockTransceiver;
/// use roomkey_hardware::{CardTransceiver, read_room};
///
/// #[tokio::main]
/// async fn main() -> roomkey_hardware::Result<()> {
///     let (mut reader, handle) = MockTransceiver::new();
///
///     let uid = vec![0x04, 0xAB, 0xCD, 0xEF];
///     handle.add_card(uid.clone(), Some(RoomId::new("101").unwrap()));
///     handle.present_card(uid).await?;
///
///     let card = reader.poll_card().await?.unwrap();
///     assert_eq!(read_room(&mut reader, &card).await?.as_str(), "101");
///     reader.release(&card).await;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransceiver {
    /// Channel receiver for card presentations
    event_rx: mpsc::Receiver<CardPresence>,

    /// Card database shared with the handle
    store: SharedStore,

    /// UID of the card whose sector is currently authenticated
    authenticated: Option<Vec<u8>>,

    /// Device name
    name: String,
}

impl MockTransceiver {
    /// Create a new mock transceiver with the default name.
    pub fn new() -> (Self, MockTransceiverHandle) {
        Self::with_name("Mock RC522".to_string())
    }

    /// Create a new mock transceiver with a custom name.
    pub fn with_name(name: String) -> (Self, MockTransceiverHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let store = SharedStore::default();

        let reader = Self {
            event_rx,
            store: Arc::clone(&store),
            authenticated: None,
            name,
        };
        let handle = MockTransceiverHandle { event_tx, store };

        (reader, handle)
    }

    fn record(&self, operation: CardOperation) {
        lock(&self.store).operations.push(operation);
    }

    fn require_session(&self, card: &CardPresence) -> Result<()> {
        if self.authenticated.as_deref() == Some(card.uid_bytes.as_slice()) {
            Ok(())
        } else {
            Err(HardwareError::authentication_failed(card.uid.as_str()))
        }
    }
}

impl CardTransceiver for MockTransceiver {
    async fn poll_card(&mut self) -> Result<Option<CardPresence>> {
        match self.event_rx.try_recv() {
            Ok(card) => Ok(Some(card)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(HardwareError::disconnected("card event channel closed"))
            }
        }
    }

    async fn authenticate(&mut self, card: &CardPresence) -> Result<()> {
        self.record(CardOperation::Authenticate {
            uid: card.uid.to_string(),
        });
        let reject = {
            let store = lock(&self.store);
            let stored = store
                .cards
                .get(&card.uid_bytes)
                .ok_or_else(|| HardwareError::no_card(card.uid.as_str()))?;
            stored.reject_auth
        };
        if reject {
            self.authenticated = None;
            return Err(HardwareError::authentication_failed(card.uid.as_str()));
        }
        self.authenticated = Some(card.uid_bytes.clone());
        Ok(())
    }

    async fn read_block(&mut self, card: &CardPresence) -> Result<RoomBlock> {
        self.record(CardOperation::Read {
            uid: card.uid.to_string(),
        });
        self.require_session(card)?;
        lock(&self.store)
            .cards
            .get(&card.uid_bytes)
            .map(|stored| stored.memory)
            .ok_or_else(|| HardwareError::card_read(format!("card {} left the field", card.uid)))
    }

    async fn write_block(&mut self, card: &CardPresence, block: &RoomBlock) -> Result<()> {
        self.record(CardOperation::Write {
            uid: card.uid.to_string(),
            block: *block,
        });
        self.require_session(card)?;
        let mut store = lock(&self.store);
        let stored = store
            .cards
            .get_mut(&card.uid_bytes)
            .ok_or_else(|| HardwareError::card_write(format!("card {} left the field", card.uid)))?;
        if stored.fail_writes {
            return Err(HardwareError::card_write("write rejected by card"));
        }
        stored.memory = *block;
        debug!(uid = %card.uid, "Mock card block written");
        Ok(())
    }

    async fn release(&mut self, card: &CardPresence) {
        self.record(CardOperation::Release {
            uid: card.uid.to_string(),
        });
        self.authenticated = None;
    }

    async fn get_reader_info(&self) -> Result<ReaderInfo> {
        Ok(ReaderInfo::new(
            self.name.clone(),
            vec!["ISO14443A".to_string()],
        ))
    }
}

/// Handle for controlling a mock transceiver.
///
/// Clones share the same card store and presentation channel.
#[derive(Debug, Clone)]
pub struct MockTransceiverHandle {
    /// Channel sender for card presentations
    event_tx: mpsc::Sender<CardPresence>,

    /// Card database shared with the transceiver
    store: SharedStore,
}

impl MockTransceiverHandle {
    /// Register a card, optionally preloaded with a room.
    pub fn add_card(&self, uid: Vec<u8>, room: Option<RoomId>) {
        let memory = room.as_ref().map(RoomBlock::encode).unwrap_or_default();
        lock(&self.store).cards.insert(
            uid,
            MockCard {
                memory,
                ..MockCard::default()
            },
        );
    }

    /// Make sector authentication fail for a card.
    pub fn reject_authentication(&self, uid: &[u8], reject: bool) {
        if let Some(card) = lock(&self.store).cards.get_mut(uid) {
            card.reject_auth = reject;
        }
    }

    /// Make block writes fail for a card.
    pub fn fail_writes(&self, uid: &[u8], fail: bool) {
        if let Some(card) = lock(&self.store).cards.get_mut(uid) {
            card.fail_writes = fail;
        }
    }

    /// Present a registered card to the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The card UID is not in the database
    /// - The UID length is invalid
    /// - The reader has been dropped and the channel is closed
    pub async fn present_card(&self, uid: Vec<u8>) -> Result<()> {
        if !lock(&self.store).cards.contains_key(&uid) {
            return Err(HardwareError::invalid_data(format!(
                "Card {uid:02X?} not in database"
            )));
        }
        let card = CardPresence::new(uid)?;
        self.event_tx
            .send(card)
            .await
            .map_err(|_| HardwareError::disconnected("card event channel closed"))
    }

    /// Current room block of a card.
    pub fn card_memory(&self, uid: &[u8]) -> Option<RoomBlock> {
        lock(&self.store).cards.get(uid).map(|card| card.memory)
    }

    /// All primitive operations performed so far.
    pub fn operations(&self) -> Vec<CardOperation> {
        lock(&self.store).operations.clone()
    }

    /// Number of block writes attempted.
    pub fn write_count(&self) -> usize {
        lock(&self.store)
            .operations
            .iter()
            .filter(|op| matches!(op, CardOperation::Write { .. }))
            .count()
    }

    /// Number of block reads attempted.
    pub fn read_count(&self) -> usize {
        lock(&self.store)
            .operations
            .iter()
            .filter(|op| matches!(op, CardOperation::Read { .. }))
            .count()
    }

    /// Number of cards in the database.
    pub fn card_count(&self) -> usize {
        lock(&self.store).cards.len()
    }
}
