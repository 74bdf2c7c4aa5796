//! Device mode state machine.
//!
//! Owns the device state: the operating mode, the assigned room and, in
//! Provision mode, the write target. The target lives inside
//! [`DeviceMode::Provision`], so Verify mode cannot carry one.
//!
//! # Valid Transitions
//!
//! - Verify → Provision(target = assigned room): write pending for our room
//! - Verify → Provision(no target): local toggle
//! - Provision(no target) → Provision(target): claimed a generic pending write
//! - Provision(target) → Verify: cancelled, or write attempt completed
//! - Provision(any) → Verify: local toggle
//!
//! A set target is never replaced by another one.
//!
//! # Examples
//!
//! ```
//! use roomkey_core::RoomId;
//! use roomkey_terminal::{DeviceMode, StateMachine};
//!
//! let mut machine = StateMachine::new(RoomId::new("101").unwrap());
//! machine.arm_for_assigned_room().unwrap();
//! assert_eq!(machine.write_target().map(|r| r.as_str()), Some("101"));
//!
//! machine.complete_write().unwrap();
//! assert_eq!(machine.mode(), &DeviceMode::Verify);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use roomkey_core::{Error, Result, RoomId};
use tokio::time::Instant;
use tracing::info;

/// Maximum number of mode transitions kept for diagnostics.
const MAX_HISTORY_SIZE: usize = 100;

/// How a write target was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetOrigin {
    /// The backend declared a pending write for the device's assigned room.
    Assigned,
    /// Claimed from the generic any-room query while provisioning unassigned.
    Claimed,
}

/// Room a Provision-mode device is trying to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTarget {
    pub room: RoomId,
    pub origin: TargetOrigin,
}

/// Operating mode of the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceMode {
    /// Presented cards are checked for access.
    #[default]
    Verify,

    /// Presented cards are written with the target room, if one is set.
    Provision { target: Option<WriteTarget> },
}

impl DeviceMode {
    #[must_use]
    pub fn is_verify(&self) -> bool {
        matches!(self, Self::Verify)
    }

    #[must_use]
    pub fn is_provision(&self) -> bool {
        matches!(self, Self::Provision { .. })
    }

    #[must_use]
    pub fn target(&self) -> Option<&WriteTarget> {
        match self {
            Self::Provision { target } => target.as_ref(),
            Self::Verify => None,
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verify => write!(f, "Verify"),
            Self::Provision { target: None } => write!(f, "Provision"),
            Self::Provision {
                target: Some(target),
            } => write!(f, "Provision({})", target.room),
        }
    }
}

/// What caused a mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionCause {
    Toggle,
    WritePending,
    WriteClaimed,
    WriteCancelled,
    WriteCompleted,
    RoomReassigned,
}

impl fmt::Display for TransitionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cause = match self {
            Self::Toggle => "toggle",
            Self::WritePending => "write pending",
            Self::WriteClaimed => "write claimed",
            Self::WriteCancelled => "write cancelled",
            Self::WriteCompleted => "write completed",
            Self::RoomReassigned => "room reassigned",
        };
        write!(f, "{cause}")
    }
}

/// A recorded mode transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: DeviceMode,
    pub to: DeviceMode,
    pub cause: TransitionCause,
    pub timestamp: Instant,
}

impl ModeTransition {
    fn new(from: DeviceMode, to: DeviceMode, cause: TransitionCause) -> Self {
        Self {
            from,
            to,
            cause,
            timestamp: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Result of changing the assigned room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomUpdate {
    /// The value equals the current room; nothing changed.
    Unchanged,

    /// The room changed. A target armed for the previous room, if any, was
    /// dropped and the device returned to Verify.
    Changed {
        previous: RoomId,
        invalidated: Option<ModeTransition>,
    },
}

impl RoomUpdate {
    #[must_use]
    pub fn changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Device mode state machine.
///
/// Not thread-safe; owned by the single control loop.
#[derive(Debug)]
pub struct StateMachine {
    mode: DeviceMode,
    assigned_room: RoomId,
    mode_entered_at: Instant,
    history: VecDeque<ModeTransition>,
}

impl StateMachine {
    /// Create a machine in Verify mode for the given room.
    #[must_use]
    pub fn new(assigned_room: RoomId) -> Self {
        Self::builder(assigned_room).build()
    }

    #[must_use]
    pub fn builder(assigned_room: RoomId) -> StateMachineBuilder {
        StateMachineBuilder {
            assigned_room,
            mode: DeviceMode::Verify,
        }
    }

    #[must_use]
    pub fn mode(&self) -> &DeviceMode {
        &self.mode
    }

    #[must_use]
    pub fn assigned_room(&self) -> &RoomId {
        &self.assigned_room
    }

    /// The room being written, if any.
    #[must_use]
    pub fn write_target(&self) -> Option<&RoomId> {
        self.mode.target().map(|t| &t.room)
    }

    #[must_use]
    pub fn time_in_current_mode(&self) -> Duration {
        self.mode_entered_at.elapsed()
    }

    /// Recent transitions, oldest first.
    #[must_use]
    pub fn history(&self) -> &VecDeque<ModeTransition> {
        &self.history
    }

    #[must_use]
    pub fn last_transitions(&self, count: usize) -> Vec<ModeTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Local toggle: Verify becomes unassigned Provision, Provision becomes
    /// Verify. Any target is dropped.
    pub fn toggle(&mut self) -> ModeTransition {
        let next = match self.mode {
            DeviceMode::Verify => DeviceMode::Provision { target: None },
            DeviceMode::Provision { .. } => DeviceMode::Verify,
        };
        self.change_mode(next, TransitionCause::Toggle)
    }

    /// Enter Provision targeting the assigned room.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless in Verify mode.
    pub fn arm_for_assigned_room(&mut self) -> Result<ModeTransition> {
        let next = DeviceMode::Provision {
            target: Some(WriteTarget {
                room: self.assigned_room.clone(),
                origin: TargetOrigin::Assigned,
            }),
        };
        if !self.mode.is_verify() {
            return Err(self.invalid(&next));
        }
        Ok(self.change_mode(next, TransitionCause::WritePending))
    }

    /// Adopt a room from the generic pending-write query.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless in Provision mode with
    /// no target.
    pub fn claim_target(&mut self, room: RoomId) -> Result<ModeTransition> {
        let next = DeviceMode::Provision {
            target: Some(WriteTarget {
                room,
                origin: TargetOrigin::Claimed,
            }),
        };
        if !matches!(self.mode, DeviceMode::Provision { target: None }) {
            return Err(self.invalid(&next));
        }
        Ok(self.change_mode(next, TransitionCause::WriteClaimed))
    }

    /// The backend withdrew the pending write: back to Verify.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless a target is set.
    pub fn cancel_target(&mut self) -> Result<ModeTransition> {
        self.leave_target(TransitionCause::WriteCancelled)
    }

    /// A write attempt finished and was reported: back to Verify.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` unless a target is set.
    pub fn complete_write(&mut self) -> Result<ModeTransition> {
        self.leave_target(TransitionCause::WriteCompleted)
    }

    /// Change the assigned room.
    ///
    /// A target armed for the previous assigned room is invalidated. Claimed
    /// targets are unrelated to the assigned room and are kept.
    pub fn set_assigned_room(&mut self, room: RoomId) -> RoomUpdate {
        if room == self.assigned_room {
            return RoomUpdate::Unchanged;
        }
        let previous = std::mem::replace(&mut self.assigned_room, room);
        info!(from = %previous, to = %self.assigned_room, "Assigned room changed");

        let invalidated = match self.mode.target() {
            Some(target) if target.origin == TargetOrigin::Assigned => {
                Some(self.change_mode(DeviceMode::Verify, TransitionCause::RoomReassigned))
            }
            _ => None,
        };
        RoomUpdate::Changed {
            previous,
            invalidated,
        }
    }

    fn leave_target(&mut self, cause: TransitionCause) -> Result<ModeTransition> {
        if self.mode.target().is_none() {
            return Err(self.invalid(&DeviceMode::Verify));
        }
        Ok(self.change_mode(DeviceMode::Verify, cause))
    }

    fn invalid(&self, to: &DeviceMode) -> Error {
        Error::InvalidStateTransition {
            from: self.mode.to_string(),
            to: to.to_string(),
        }
    }

    fn change_mode(&mut self, next: DeviceMode, cause: TransitionCause) -> ModeTransition {
        let previous = std::mem::replace(&mut self.mode, next);
        let transition = ModeTransition::new(previous, self.mode.clone(), cause);
        info!(from = %transition.from, to = %transition.to, %cause, "Mode changed");

        self.mode_entered_at = transition.timestamp;
        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        transition
    }
}

/// Builder for restoring a machine in a given mode.
#[derive(Debug)]
pub struct StateMachineBuilder {
    assigned_room: RoomId,
    mode: DeviceMode,
}

impl StateMachineBuilder {
    #[must_use]
    pub fn with_mode(mut self, mode: DeviceMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn build(self) -> StateMachine {
        StateMachine {
            mode: self.mode,
            assigned_room: self.assigned_room,
            mode_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }
}
