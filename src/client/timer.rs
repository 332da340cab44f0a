// ABOUTME: Cancellable one-shot and repeating deadlines polled by the session loop
// ABOUTME: A cancelled timer is simply dropped, so "is it pending" is a plain Option check

use std::time::Duration;
use tokio::time::Instant;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// No bind response yet; tear the connection down
    BindTimeout,
    /// Send enquire_link to keep the session alive
    EnquireLink,
}

/// A deadline owned by the session.
///
/// Timers never run on their own. The session holds them as
/// `Option<Timer>`, polls `is_due` from its single task and sets the handle
/// to `None` to cancel, which makes cancellation and firing mutually
/// exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    kind: TimerKind,
    deadline: Instant,
    period: Option<Duration>,
}

impl Timer {
    /// Fire once, `after` from `now`.
    pub fn once(kind: TimerKind, now: Instant, after: Duration) -> Self {
        Self {
            kind,
            deadline: now + after,
            period: None,
        }
    }

    /// Fire every `period`, first at `now + period`.
    pub fn repeating(kind: TimerKind, now: Instant, period: Duration) -> Self {
        Self {
            kind,
            deadline: now + period,
            period: Some(period),
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_repeating(&self) -> bool {
        self.period.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Schedule the next firing of a repeating timer. Returns false for
    /// one-shot timers, which stay spent.
    pub fn rearm(&mut self, now: Instant) -> bool {
        match self.period {
            Some(period) => {
                self.deadline = now + period;
                true
            }
            None => false,
        }
    }
}
