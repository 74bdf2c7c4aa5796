//! Debounce filter for Verify-mode presentations.
//!
//! A card left on the reader is reported again on every poll. The filter
//! lets the first presentation of a UID through and suppresses repeats of
//! that UID until the cooldown has elapsed since that accepted presentation.
//! Suppressed presentations do not restart the window.
//!
//! Only the access decision is gated. Writes and inspections process every
//! presentation.

use std::time::Duration;

use roomkey_core::CardUid;
use tokio::time::Instant;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct DebounceFilter {
    cooldown: Duration,
    last: Option<(CardUid, Instant)>,
}

impl DebounceFilter {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Decide whether a presentation of `uid` at `now` reaches the access
    /// decision. Records it when accepted.
    pub fn accept(&mut self, uid: &CardUid, now: Instant) -> bool {
        if let Some((last_uid, seen_at)) = &self.last
            && last_uid == uid
            && now.saturating_duration_since(*seen_at) < self.cooldown
        {
            trace!(%uid, "Presentation debounced");
            return false;
        }
        self.last = Some((uid.clone(), now));
        true
    }

    #[must_use]
    pub fn last_uid(&self) -> Option<&CardUid> {
        self.last.as_ref().map(|(uid, _)| uid)
    }
}
