//! Debounce pipeline
//!
//! Every submission replaces the pending envelope and pushes the delivery
//! deadline to `quiet period` after itself. When a deadline passes untouched
//! the pending envelope is delivered.
//!
//! The pipeline is built on first submission, from the settings as they are
//! then. Until that succeeds every submission re-validates and fails.

use chrono::Local;
use log::{debug, trace};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tempo_core::{ConfigResult, DebounceSettings};
use tempo_ports::{Clock, Envelope, TimerHandle};

/// Property set on every delivered message
pub const INFO_PROPERTY: &str = "info";

struct DelayTimer {
    generation: u64,
    handle: TimerHandle,
}

struct Pipeline {
    quiet_period: Duration,
    pending: Option<Envelope>,
    timer: Option<DelayTimer>,
    next_generation: u64,
}

impl Pipeline {
    fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
            timer: None,
            next_generation: 0,
        }
    }
}

struct DebounceState {
    pipeline: Option<Pipeline>,
    closed: bool,
}

struct Shared {
    settings: DebounceSettings,
    clock: Arc<dyn Clock>,
    state: Mutex<DebounceState>,
}

impl Shared {
    fn on_quiet(&self, generation: u64) {
        let (mut envelope, quiet_ms) = {
            let mut state = self.state.lock();
            let Some(pipeline) = state.pipeline.as_mut() else {
                return;
            };

            // Superseded deadlines have no effect
            match &pipeline.timer {
                Some(timer) if timer.generation == generation => {}
                _ => return,
            }
            pipeline.timer = None;

            let Some(envelope) = pipeline.pending.take() else {
                return;
            };
            (envelope, pipeline.quiet_period.as_millis())
        };

        envelope.message_mut().set_property(
            INFO_PROPERTY,
            format!(
                "received at {} and debounced for {}ms",
                Local::now().format("%d/%m/%Y - %H:%M:%S"),
                quiet_ms
            ),
        );

        debug!(
            "Delivering message {} after {}ms quiet",
            envelope.message().id,
            quiet_ms
        );
        // Lock released: the receiver may call back into the engine
        envelope.deliver();
    }
}

/// Collapses a burst of envelopes into a single delivery of the last one
///
/// Superseded envelopes are dropped without being completed. Dropping the
/// engine shuts it down.
pub struct DebounceEngine {
    shared: Arc<Shared>,
}

impl DebounceEngine {
    pub fn new(settings: DebounceSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings,
                clock,
                state: Mutex::new(DebounceState {
                    pipeline: None,
                    closed: false,
                }),
            }),
        }
    }

    /// Submit an envelope, restarting the quiet period
    ///
    /// Fails, without keeping the envelope, while the settings are invalid.
    pub fn submit(&self, envelope: Envelope) -> ConfigResult<()> {
        let shared = &self.shared;
        let mut state = shared.state.lock();
        if state.closed {
            debug!("Dropping message {} after shutdown", envelope.message().id);
            return Ok(());
        }

        if state.pipeline.is_none() {
            let quiet_period = shared.settings.quiet_period()?;
            debug!("Debounce pipeline built ({}ms)", quiet_period.as_millis());
            state.pipeline = Some(Pipeline::new(quiet_period));
        }
        let Some(pipeline) = state.pipeline.as_mut() else {
            return Ok(());
        };

        if let Some(previous) = pipeline.timer.take() {
            shared.clock.cancel(previous.handle);
        }
        pipeline.pending = Some(envelope);

        let generation = pipeline.next_generation;
        pipeline.next_generation += 1;

        let weak: Weak<Shared> = Arc::downgrade(shared);
        let handle = shared.clock.schedule_once(
            pipeline.quiet_period,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.on_quiet(generation);
                }
            }),
        );
        pipeline.timer = Some(DelayTimer { generation, handle });
        trace!("Debounce deadline {} rescheduled ({})", generation, handle);

        Ok(())
    }

    /// Cancel the pending delivery and refuse further submissions
    ///
    /// The pending envelope, if any, is dropped undelivered.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        if let Some(pipeline) = state.pipeline.as_mut() {
            if let Some(timer) = pipeline.timer.take() {
                self.shared.clock.cancel(timer.handle);
            }
            pipeline.pending = None;
        }
    }

    /// Whether the pipeline has been built
    pub fn is_built(&self) -> bool {
        self.shared.state.lock().pipeline.is_some()
    }

    /// Quiet period captured when the pipeline was built
    pub fn debounce(&self) -> Option<Duration> {
        self.shared
            .state
            .lock()
            .pipeline
            .as_ref()
            .map(|p| p.quiet_period)
    }

    /// Whether an envelope is waiting for its quiet period to pass
    pub fn has_pending(&self) -> bool {
        self.shared
            .state
            .lock()
            .pipeline
            .as_ref()
            .is_some_and(|p| p.pending.is_some())
    }
}

impl Drop for DebounceEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
