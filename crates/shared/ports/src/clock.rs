use std::fmt;
use std::time::Duration;

/// Opaque handle to a scheduled timer, unique per clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Work run when a timer fires
pub type TimerTask = Box<dyn FnMut() + Send + 'static>;

/// Port for scheduling delayed and periodic callbacks
///
/// This allows nodes to run against different time sources:
/// - The host's real timers in production
/// - A virtual clock that only moves when a test advances it
///
/// Cancellation is synchronous: once `cancel` returns, the task of that
/// timer is never started again. Cancelling a timer that already fired (or
/// was never scheduled here) does nothing.
pub trait Clock: Send + Sync {
    /// Time elapsed on this clock's timeline
    fn now(&self) -> Duration;

    /// Run `task` once, `delay` from now
    fn schedule_once(&self, delay: Duration, task: TimerTask) -> TimerHandle;

    /// Run `task` every `period`, first after one full period
    fn schedule_repeating(&self, period: Duration, task: TimerTask) -> TimerHandle;

    /// Stop a timer
    fn cancel(&self, handle: TimerHandle);

    /// Get the clock's name/identifier for debugging
    fn name(&self) -> &str {
        "Clock"
    }
}
