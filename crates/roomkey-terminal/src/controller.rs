//! Terminal controller: the single cooperative control loop.
//!
//! One [`tick`](Terminal::tick) runs the due pollers in fixed order
//! (config sync, pending write, inspection flag, heartbeat) and then handles
//! at most one card presentation to completion. Every backend call is bounded
//! by the configured timeout. No error escapes a tick: each poller and each
//! presentation logs its own failure and the next tick starts fresh.
//!
//! A presentation is routed as follows:
//!
//! 1. inspection pending → read the card and report it (any mode)
//! 2. Provision → write the target room
//! 3. Verify → debounce, then the access decision
//!
//! The card is released after every presentation.

use std::fmt;
use std::time::Duration;

use roomkey_core::{ReaderId, RoomId};
use roomkey_hardware::{CardPresence, CardTransceiver, LocalInput};
use roomkey_network::Backend;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::access::{AccessDecision, decide_access};
use crate::bounded::BoundedBackend;
use crate::clock::{SystemTimeSource, TimeSource};
use crate::config::TerminalConfig;
use crate::debounce::DebounceFilter;
use crate::display::{Screen, VirtualDisplay};
use crate::error::Result;
use crate::inspection::{InspectionHandler, InspectionOutcome};
use crate::provision::{ProvisionOutcome, provision_card};
use crate::reconcile::reconcile_pending_write;
use crate::schedule::{PollSchedule, Poller};
use crate::state_machine::{DeviceMode, StateMachine};
use crate::sync::{SyncOutcome, sync_assigned_room};

/// What happened to a card presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationOutcome {
    Inspected(InspectionOutcome),
    Provisioned(ProvisionOutcome),
    Access(AccessDecision),
    /// Same card again within the cooldown; no decision made.
    Debounced,
}

/// Summary of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Pollers that ran, in order.
    pub polled: Vec<Poller>,
    pub presentation: Option<PresentationOutcome>,
}

/// Snapshot for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalStatus {
    pub reader: ReaderId,
    pub mode: DeviceMode,
    pub assigned_room: RoomId,
    pub inspection_pending: bool,
    pub uptime: Duration,
}

impl fmt::Display for TerminalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reader={} mode={} room={} inspect={} uptime={}s",
            self.reader,
            self.mode,
            self.assigned_room,
            self.inspection_pending,
            self.uptime.as_secs()
        )
    }
}

/// The terminal core.
///
/// Owns the transceiver, so all card operations are serialized, and the
/// device state, so every mutation goes through the state machine.
pub struct Terminal<T: CardTransceiver, B: Backend> {
    reader: T,
    backend: BoundedBackend<B>,
    reader_id: ReaderId,
    machine: StateMachine,
    debounce: DebounceFilter,
    inspection: InspectionHandler,
    schedule: PollSchedule,
    display: VirtualDisplay,
    clock: Box<dyn TimeSource>,
    started_at: Instant,
}

impl<T: CardTransceiver, B: Backend> Terminal<T, B> {
    /// Create a terminal in Verify mode for the configured room.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured reader or room id is blank.
    pub fn new(config: &TerminalConfig, reader: T, backend: B) -> Result<Self> {
        let room = config.initial_room()?;
        Ok(Self {
            reader,
            backend: BoundedBackend::new(backend, config.backend_timeout()),
            reader_id: config.reader()?,
            display: VirtualDisplay::new(Screen::Ready { room: room.clone() }),
            machine: StateMachine::new(room),
            debounce: DebounceFilter::new(config.debounce()),
            inspection: InspectionHandler::new(),
            schedule: config.poll_schedule(),
            clock: Box::new(SystemTimeSource),
            started_at: Instant::now(),
        })
    }

    /// Use another wall-clock source for card read timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl TimeSource + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn mode(&self) -> &DeviceMode {
        self.machine.mode()
    }

    #[must_use]
    pub fn assigned_room(&self) -> &RoomId {
        self.machine.assigned_room()
    }

    #[must_use]
    pub fn state_machine(&self) -> &StateMachine {
        &self.machine
    }

    #[must_use]
    pub fn display(&self) -> &VirtualDisplay {
        &self.display
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        self.backend.inner()
    }

    #[must_use]
    pub fn reader(&self) -> &T {
        &self.reader
    }

    #[must_use]
    pub fn inspection_pending(&self) -> bool {
        self.inspection.is_pending()
    }

    #[must_use]
    pub fn status(&self) -> TerminalStatus {
        TerminalStatus {
            reader: self.reader_id.clone(),
            mode: self.machine.mode().clone(),
            assigned_room: self.machine.assigned_room().clone(),
            inspection_pending: self.inspection.is_pending(),
            uptime: self.started_at.elapsed(),
        }
    }

    /// Run one loop iteration: due pollers, then at most one presentation.
    pub async fn tick(&mut self) -> TickReport {
        let now = Instant::now();
        self.display.update(now);

        let polled = self.schedule.due(now);
        for poller in &polled {
            self.run_poller(*poller).await;
        }

        let presentation = match self.reader.poll_card().await {
            Ok(Some(card)) => Some(self.handle_presentation(card).await),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Card poll failed");
                None
            }
        };

        self.refresh_base_screen();
        TickReport {
            polled,
            presentation,
        }
    }

    /// Apply a local control input.
    pub fn handle_input(&mut self, input: LocalInput) {
        match input {
            LocalInput::ToggleMode => {
                self.machine.toggle();
            }
            LocalInput::SetRoom(_) => match input.requested_room() {
                Some(room) => {
                    if self.machine.set_assigned_room(room.clone()).changed() {
                        info!(%room, "Room id updated locally");
                        self.display.show(Screen::RoomUpdated { room });
                    }
                }
                None => debug!("Blank room input ignored"),
            },
            other => debug!(?other, "Unhandled local input"),
        }
        self.refresh_base_screen();
    }

    async fn run_poller(&mut self, poller: Poller) {
        match poller {
            Poller::ConfigSync => {
                let outcome =
                    sync_assigned_room(&self.backend, &self.reader_id, &mut self.machine).await;
                if let SyncOutcome::Adopted { room, .. } = outcome {
                    self.display.show(Screen::RemoteRoomSet { room });
                }
            }
            Poller::PendingWrite => {
                if let Err(e) = reconcile_pending_write(&self.backend, &mut self.machine).await {
                    warn!(error = %e, "Pending write check failed");
                }
            }
            Poller::Inspection => {
                if let Err(e) = self.inspection.refresh(&self.backend).await {
                    warn!(error = %e, "Inspection flag check failed");
                }
            }
            Poller::Heartbeat => {
                info!(
                    uptime_s = self.started_at.elapsed().as_secs(),
                    mode = %self.machine.mode(),
                    room = %self.machine.assigned_room(),
                    "Heartbeat"
                );
            }
        }
    }

    async fn handle_presentation(&mut self, card: CardPresence) -> PresentationOutcome {
        debug!(uid = %card.uid, mode = %self.machine.mode(), "Card presented");

        let outcome = if self.inspection.is_pending() {
            let outcome = self
                .inspection
                .inspect(&mut self.reader, &self.backend, &card)
                .await;
            self.display.show(match &outcome {
                InspectionOutcome::Found(room) => Screen::CardRoom { room: room.clone() },
                InspectionOutcome::Unreadable => Screen::InspectFailed,
            });
            PresentationOutcome::Inspected(outcome)
        } else if self.machine.mode().is_provision() {
            let outcome =
                provision_card(&mut self.reader, &self.backend, &mut self.machine, &card).await;
            match &outcome {
                ProvisionOutcome::Written(_) => self.display.show(Screen::WriteSucceeded),
                ProvisionOutcome::Failed(_) => self.display.show(Screen::WriteFailed),
                ProvisionOutcome::NoTarget => {}
            }
            PresentationOutcome::Provisioned(outcome)
        } else if !self.debounce.accept(&card.uid, Instant::now()) {
            PresentationOutcome::Debounced
        } else {
            let decision = decide_access(
                &mut self.reader,
                &self.backend,
                self.clock.as_ref(),
                &card,
                self.machine.assigned_room(),
            )
            .await;
            self.display.show(match decision {
                AccessDecision::Granted => Screen::Unlocked {
                    room: self.machine.assigned_room().clone(),
                },
                AccessDecision::Denied(reason) => Screen::Denied(reason),
            });
            PresentationOutcome::Access(decision)
        };

        self.reader.release(&card).await;
        outcome
    }

    fn refresh_base_screen(&mut self) {
        let screen = match self.machine.mode() {
            DeviceMode::Verify => Screen::Ready {
                room: self.machine.assigned_room().clone(),
            },
            DeviceMode::Provision { target: None } => Screen::WriterWaiting,
            DeviceMode::Provision {
                target: Some(target),
            } => Screen::WriteArmed {
                room: target.room.clone(),
            },
        };
        self.display.set_base(screen);
    }
}
