//! Rebuild scheduling state machine.
//!
//! ```text
//!          event                 deadline               done
//!  Idle ──────────► Pending ─────────────► Rebuilding ───────► Idle
//!                   │    ▲                      │
//!                   └────┘ event (re-arm)       └──► Pending  (events during rebuild)
//! ```
//!
//! Pure timing: the actor owns the one timer and resets it to whatever
//! deadline this returns.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    PendingRebuild,
    Rebuilding,
}

#[derive(Debug)]
pub(super) struct Debouncer {
    state: WatchState,
    delay: Duration,
    /// A relevant event arrived while rebuilding.
    dirty: bool,
}

impl Debouncer {
    pub(super) const fn new(delay: Duration) -> Self {
        Self {
            state: WatchState::Idle,
            delay,
            dirty: false,
        }
    }

    #[cfg(test)]
    pub(super) const fn state(&self) -> WatchState {
        self.state
    }

    pub(super) fn is_pending(&self) -> bool {
        self.state == WatchState::PendingRebuild
    }

    /// Record a relevant event. Returns the deadline to (re)arm the timer at.
    pub(super) fn on_event(&mut self, now: Instant) -> Option<Instant> {
        match self.state {
            WatchState::Idle | WatchState::PendingRebuild => {
                self.state = WatchState::PendingRebuild;
                Some(now + self.delay)
            }
            WatchState::Rebuilding => {
                self.dirty = true;
                None
            }
        }
    }

    /// Timer fired or a rebuild is forced. Returns false if nothing was pending.
    pub(super) fn start(&mut self) -> bool {
        if self.state == WatchState::Rebuilding {
            return false;
        }
        self.state = WatchState::Rebuilding;
        true
    }

    /// Rebuild finished. Returns a deadline if events arrived meanwhile.
    pub(super) fn finish(&mut self, now: Instant) -> Option<Instant> {
        if std::mem::take(&mut self.dirty) {
            self.state = WatchState::PendingRebuild;
            Some(now + self.delay)
        } else {
            self.state = WatchState::Idle;
            None
        }
    }
}
