//! Poll scheduler.
//!
//! Each poller has its own period and next-due instant. A tick returns the
//! pollers that are due, always in [`Poller::ALL`] order, and pushes each of
//! them one period past `now`. Every poller is due on the first tick.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Periodic background tasks of the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Poller {
    ConfigSync,
    PendingWrite,
    Inspection,
    Heartbeat,
}

impl Poller {
    /// Fixed run order within a tick.
    pub const ALL: [Poller; 4] = [
        Poller::ConfigSync,
        Poller::PendingWrite,
        Poller::Inspection,
        Poller::Heartbeat,
    ];
}

impl fmt::Display for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConfigSync => "config-sync",
            Self::PendingWrite => "pending-write",
            Self::Inspection => "inspection",
            Self::Heartbeat => "heartbeat",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    poller: Poller,
    period: Duration,
    next_due: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct PollSchedule {
    slots: Vec<Slot>,
}

impl PollSchedule {
    /// Build a schedule from `(poller, period)` pairs. Pollers missing from
    /// `periods` never run.
    #[must_use]
    pub fn new(periods: &[(Poller, Duration)]) -> Self {
        let slots = Poller::ALL
            .into_iter()
            .filter_map(|poller| {
                periods
                    .iter()
                    .find(|(p, _)| *p == poller)
                    .map(|&(poller, period)| Slot {
                        poller,
                        period,
                        next_due: None,
                    })
            })
            .collect();
        Self { slots }
    }

    /// Pollers due at `now`, in run order. Marks them as run.
    pub fn due(&mut self, now: Instant) -> Vec<Poller> {
        let mut due = Vec::new();
        for slot in &mut self.slots {
            if slot.next_due.is_none_or(|at| now >= at) {
                slot.next_due = Some(now + slot.period);
                due.push(slot.poller);
            }
        }
        due
    }

    /// Earliest instant at which some poller becomes due. `None` if a
    /// poller has never run.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots
            .iter()
            .map(|slot| slot.next_due)
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .min()
    }

    #[must_use]
    pub fn period(&self, poller: Poller) -> Option<Duration> {
        self.slots
            .iter()
            .find(|slot| slot.poller == poller)
            .map(|slot| slot.period)
    }
}
