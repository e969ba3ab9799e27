use std::time::Duration;

use tokio::time::Instant;

/// Flush lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Scheduled,
    Flushing,
}

/// Debounce and retry bookkeeping for grid flushes.
///
/// Every edit pushes the deadline back by the debounce interval. At most one
/// flush is in flight; edits made meanwhile re-arm the deadline so a later
/// flush picks them up. A failed flush keeps the sheet dirty and retries after
/// `debounce * 2^failures`, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    debounce: Duration,
    max_delay: Duration,
    deadline: Option<Instant>,
    in_flight: bool,
    dirty: bool,
    failures: u32,
}

impl SyncScheduler {
    pub fn new(debounce: Duration, max_delay: Duration) -> Self {
        Self {
            debounce,
            max_delay: max_delay.max(debounce),
            deadline: None,
            in_flight: false,
            dirty: false,
            failures: 0,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn state(&self) -> SyncState {
        if self.in_flight {
            SyncState::Flushing
        } else if self.deadline.is_some() {
            SyncState::Scheduled
        } else {
            SyncState::Idle
        }
    }

    /// Whether edits exist that no successful or running flush has captured.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Records an edit and restarts the debounce timer.
    pub fn notify_dirty(&mut self, now: Instant) {
        self.dirty = true;
        self.deadline = Some(now + self.debounce);
    }

    /// Asks for a flush as soon as the current one, if any, completes.
    pub fn request_now(&mut self, now: Instant) {
        self.dirty = true;
        self.deadline = Some(now);
    }

    /// When the next flush should start; `None` while idle or flushing.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.in_flight {
            None
        } else {
            self.deadline
        }
    }

    /// Starts a flush if the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_deadline() {
            Some(deadline) if deadline <= now => {
                self.start();
                true
            }
            _ => false,
        }
    }

    /// Starts a flush immediately, bypassing the debounce. Fails while one is in flight.
    pub fn begin_manual(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.start();
        true
    }

    /// Records the end of the in-flight flush.
    pub fn finish(&mut self, success: bool, now: Instant) {
        self.in_flight = false;
        if success {
            self.failures = 0;
            return;
        }
        self.failures = self.failures.saturating_add(1);
        self.dirty = true;
        let retry_at = now + self.backoff();
        self.deadline = Some(match self.deadline {
            Some(pending) => pending.max(retry_at),
            None => retry_at,
        });
    }

    /// Delay before the next retry given the current failure count.
    pub fn backoff(&self) -> Duration {
        let factor = 1u32.checked_shl(self.failures).unwrap_or(u32::MAX);
        self.debounce
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn start(&mut self) {
        self.deadline = None;
        self.in_flight = true;
        self.dirty = false;
    }
}
