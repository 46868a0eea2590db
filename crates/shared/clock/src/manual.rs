use log::{trace, warn};
use parking_lot::Mutex;
use priority_queue::PriorityQueue;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempo_ports::{Clock, TimerHandle, TimerTask};

use crate::error::{ClockError, ClockResult};

/// Shortest period a repeating timer may have
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// A scheduled timer. `task` is `None` while the task is running.
struct Timer {
    period: Option<Duration>,
    task: Option<TimerTask>,
}

struct State {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    /// Armed timers, earliest due first, ties in arming order
    queue: PriorityQueue<TimerHandle, Reverse<(Duration, u64)>>,
    timers: HashMap<TimerHandle, Timer>,
}

impl State {
    fn arm(&mut self, handle: TimerHandle, due: Duration) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(handle, Reverse((due, seq)));
    }
}

/// Virtual clock - time only moves when told to
///
/// The deterministic counterpart of the host's timers, for tests and
/// simulations. Timers fire in due order while `advance`/`advance_to`/
/// `run_all` moves time forward; during a task, `now()` reads that timer's
/// due time. Tasks run without the clock's lock held, so they may schedule
/// and cancel timers, including their own.
pub struct ManualClock {
    state: Mutex<State>,
}

impl ManualClock {
    /// Create a new manual clock at time zero
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                now: Duration::ZERO,
                next_id: 1,
                next_seq: 0,
                queue: PriorityQueue::new(),
                timers: HashMap::new(),
            }),
        })
    }

    /// Number of live (scheduled, not cancelled, not finished) timers
    pub fn pending(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Advance the clock by `by`, firing every timer that falls due
    ///
    /// Returns the number of timer fires.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Advance the clock to `target`, firing every timer due up to and including it
    ///
    /// Moving backwards is ignored.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;
        while self.fire_next(target) {
            fired += 1;
        }

        let mut state = self.state.lock();
        if state.now < target {
            state.now = target;
        }
        fired
    }

    /// Fire timers until none are left
    ///
    /// Fails once `loop_limit` timers have fired and more are still pending,
    /// which is what a repeating timer that is never cancelled looks like.
    pub fn run_all(&self, loop_limit: usize) -> ClockResult<usize> {
        let mut fired = 0;
        loop {
            if self.pending() == 0 {
                return Ok(fired);
            }
            if fired >= loop_limit {
                return Err(ClockError::LoopLimitExceeded(loop_limit));
            }
            if !self.fire_next(Duration::MAX) {
                return Ok(fired);
            }
            fired += 1;
        }
    }

    /// Fire the earliest timer due at or before `limit`
    fn fire_next(&self, limit: Duration) -> bool {
        let (handle, due, mut task) = {
            let mut state = self.state.lock();
            loop {
                let Some((&handle, &Reverse((due, _)))) = state.queue.peek() else {
                    return false;
                };
                if due > limit {
                    return false;
                }
                state.queue.pop();

                let task = state.timers.get_mut(&handle).and_then(|t| t.task.take());
                if let Some(task) = task {
                    if state.now < due {
                        state.now = due;
                    }
                    break (handle, due, task);
                }
            }
        };

        trace!("Firing {} at {:?}", handle, due);
        task();

        let mut state = self.state.lock();
        let period = match state.timers.get_mut(&handle) {
            // Cancelled while running
            None => return true,
            Some(timer) => match timer.period {
                Some(period) => {
                    timer.task = Some(task);
                    Some(period)
                }
                None => None,
            },
        };

        match period {
            Some(period) => state.arm(handle, due.saturating_add(period)),
            None => {
                state.timers.remove(&handle);
            }
        }
        true
    }

    fn schedule(&self, delay: Duration, period: Option<Duration>, task: TimerTask) -> TimerHandle {
        let mut state = self.state.lock();
        let handle = TimerHandle::new(state.next_id);
        state.next_id += 1;

        let due = state.now.saturating_add(delay);
        state.timers.insert(
            handle,
            Timer {
                period,
                task: Some(task),
            },
        );
        state.arm(handle, due);
        handle
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule_once(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        self.schedule(delay, None, task)
    }

    fn schedule_repeating(&self, period: Duration, task: TimerTask) -> TimerHandle {
        let period = if period < MIN_PERIOD {
            warn!("Repeating timer period {:?} raised to {:?}", period, MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };
        self.schedule(period, Some(period), task)
    }

    fn cancel(&self, handle: TimerHandle) {
        let mut state = self.state.lock();
        state.timers.remove(&handle);
        state.queue.remove(&handle);
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
