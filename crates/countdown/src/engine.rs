//! Countdown state machine
//!
//! ```text
//!            submit(true)                       timer fires, ticks >= 1
//!   ┌──────┐ ───────────────► ┌─────────┐ ◄──────────────────────────┐
//!   │ Idle │                  │ Running │ ───────────────────────────┘
//!   └──────┘ ◄─────────────── └─────────┘
//!            submit(false)  -> Cancel
//!            ticks < 1      -> Complete(0)
//! ```
//!
//! A `true` while running is ignored, or restarts the run from the top when
//! `restartOnSecondMessage` is set.

use log::debug;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tempo_core::CountdownConfig;
use tempo_ports::{Clock, TimerHandle};

/// Nominal time between two ticks
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// `ticks_remaining` while no countdown is in progress
pub const IDLE: i64 = -1;

/// Notification emitted by a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Remaining count after a start or a decrement
    Tick(i64),
    /// The run reached zero; always carries `0`
    Complete(i64),
    /// The run was stopped by a `false` signal
    Cancel,
}

/// Receives countdown notifications
///
/// Called with the engine's state lock held, so notifications arrive in
/// order. Implementations must not submit to the same engine synchronously.
pub trait CountdownListener: Send + Sync {
    fn notify(&self, event: CountdownEvent);
}

/// What a submitted signal did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    Started,
    Restarted,
    /// `true` during a run with restart disabled
    Ignored,
    Cancelled,
    /// `false` with nothing to cancel
    AlreadyIdle,
    /// Payload was not a boolean
    NotBoolean,
    /// The engine was shut down
    Closed,
}

struct ActiveRun {
    run: u64,
    timer: TimerHandle,
}

struct CountdownState {
    ticks_remaining: i64,
    active: Option<ActiveRun>,
    next_run: u64,
    closed: bool,
}

struct Shared {
    config: CountdownConfig,
    period: Duration,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn CountdownListener>,
    state: Mutex<CountdownState>,
}

impl Shared {
    fn start(self: &Arc<Self>, state: &mut CountdownState) {
        let run = state.next_run;
        state.next_run += 1;

        let from = i64::from(self.config.count_from());
        state.ticks_remaining = from;
        self.listener.notify(CountdownEvent::Tick(from));

        let weak: Weak<Shared> = Arc::downgrade(self);
        let timer = self.clock.schedule_repeating(
            self.period,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.on_tick(run);
                }
            }),
        );
        state.active = Some(ActiveRun { run, timer });
        debug!("Countdown run {} started from {}", run, from);
    }

    fn stop(&self, state: &mut CountdownState) {
        if let Some(active) = state.active.take() {
            self.clock.cancel(active.timer);
        }
        state.ticks_remaining = IDLE;
    }

    fn on_tick(&self, run: u64) {
        let mut state = self.state.lock();

        // A fire from a cancelled or restarted run has no effect
        match &state.active {
            Some(active) if active.run == run => {}
            _ => return,
        }

        state.ticks_remaining -= 1;
        if state.ticks_remaining < 1 {
            self.stop(&mut state);
            debug!("Countdown run {} complete", run);
            self.listener.notify(CountdownEvent::Complete(0));
        } else {
            self.listener
                .notify(CountdownEvent::Tick(state.ticks_remaining));
        }
    }
}

/// Converts boolean signals into tick / complete / cancel notifications
///
/// Owns at most one periodic timer on its clock at any time. Dropping the
/// engine shuts it down.
pub struct CountdownEngine {
    shared: Arc<Shared>,
}

impl CountdownEngine {
    /// Create an engine ticking once per [`DEFAULT_TICK_PERIOD`]
    pub fn new(
        config: CountdownConfig,
        clock: Arc<dyn Clock>,
        listener: Arc<dyn CountdownListener>,
    ) -> Self {
        Self::with_period(config, DEFAULT_TICK_PERIOD, clock, listener)
    }

    /// Create an engine with a custom tick period
    pub fn with_period(
        config: CountdownConfig,
        period: Duration,
        clock: Arc<dyn Clock>,
        listener: Arc<dyn CountdownListener>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                period,
                clock,
                listener,
                state: Mutex::new(CountdownState {
                    ticks_remaining: IDLE,
                    active: None,
                    next_run: 0,
                    closed: false,
                }),
            }),
        }
    }

    /// Feed a control signal: `true` starts (or restarts), `false` cancels
    pub fn submit(&self, payload: &Value) -> SignalOutcome {
        let Some(signal) = payload.as_bool() else {
            return SignalOutcome::NotBoolean;
        };

        let shared = &self.shared;
        let mut state = shared.state.lock();
        if state.closed {
            return SignalOutcome::Closed;
        }

        let running = state.active.is_some();
        match (signal, running) {
            (false, false) => SignalOutcome::AlreadyIdle,
            (false, true) => {
                shared.stop(&mut state);
                debug!("Countdown cancelled");
                shared.listener.notify(CountdownEvent::Cancel);
                SignalOutcome::Cancelled
            }
            (true, true) if !shared.config.restart_on_second_message() => SignalOutcome::Ignored,
            (true, true) => {
                shared.stop(&mut state);
                shared.start(&mut state);
                SignalOutcome::Restarted
            }
            (true, false) => {
                shared.start(&mut state);
                SignalOutcome::Started
            }
        }
    }

    /// Cancel any outstanding timer and refuse further signals
    ///
    /// Emits nothing. Safe to call more than once.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        self.shared.stop(&mut state);
        state.closed = true;
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().active.is_some()
    }

    /// Remaining count, [`IDLE`] when no countdown is in progress
    pub fn ticks_remaining(&self) -> i64 {
        self.shared.state.lock().ticks_remaining
    }
}

impl Drop for CountdownEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
