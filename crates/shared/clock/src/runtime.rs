use dashmap::DashMap;
use log::{trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tempo_ports::{Clock, TimerHandle, TimerTask};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{ClockError, ClockResult};
use crate::manual::MIN_PERIOD;

struct Registration {
    live: Arc<AtomicBool>,
    abort: AbortHandle,
}

/// Real clock backed by tokio timers
///
/// Each timer is a task on the captured runtime. On a current-thread runtime
/// (the cooperative model nodes are written for) `cancel` is exact. On a
/// multi-thread runtime a task that already started finishes its current
/// run; nodes guard every fire with their own run token, so a stale fire has
/// no effect there either.
pub struct TokioClock {
    runtime: Handle,
    started: Instant,
    next_id: AtomicU64,
    timers: Arc<DashMap<TimerHandle, Registration>>,
}

impl TokioClock {
    /// Create a clock on the current tokio runtime
    pub fn new() -> ClockResult<Arc<Self>> {
        let runtime = Handle::try_current().map_err(|e| ClockError::NoRuntime(e.to_string()))?;
        Ok(Self::with_handle(runtime))
    }

    /// Create a clock spawning its timers on `runtime`
    pub fn with_handle(runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            runtime,
            started: Instant::now(),
            next_id: AtomicU64::new(1),
            timers: Arc::new(DashMap::new()),
        })
    }

    /// Number of live timers
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    fn next_handle(&self) -> TimerHandle {
        TimerHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn register(&self, handle: TimerHandle, live: Arc<AtomicBool>, abort: AbortHandle) {
        self.timers.insert(
            handle,
            Registration {
                live: live.clone(),
                abort,
            },
        );
        // A one-shot timer may already have fired before it was registered
        if !live.load(Ordering::SeqCst) {
            self.timers.remove(&handle);
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started)
    }

    fn schedule_once(&self, delay: Duration, mut task: TimerTask) -> TimerHandle {
        let handle = self.next_handle();
        let live = Arc::new(AtomicBool::new(true));
        let flag = live.clone();
        let timers = Arc::clone(&self.timers);

        let join = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if flag.swap(false, Ordering::SeqCst) {
                timers.remove(&handle);
                trace!("Firing {}", handle);
                task();
            }
        });

        self.register(handle, live, join.abort_handle());
        handle
    }

    fn schedule_repeating(&self, period: Duration, mut task: TimerTask) -> TimerHandle {
        let period = if period < MIN_PERIOD {
            warn!("Repeating timer period {:?} raised to {:?}", period, MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };

        let handle = self.next_handle();
        let live = Arc::new(AtomicBool::new(true));
        let flag = live.clone();

        let join = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !flag.load(Ordering::SeqCst) {
                    break;
                }
                trace!("Firing {}", handle);
                task();
            }
        });

        self.register(handle, live, join.abort_handle());
        handle
    }

    fn cancel(&self, handle: TimerHandle) {
        if let Some((_, registration)) = self.timers.remove(&handle) {
            registration.live.store(false, Ordering::SeqCst);
            registration.abort.abort();
        }
    }

    fn name(&self) -> &str {
        "TokioClock"
    }
}

impl Drop for TokioClock {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            entry.live.store(false, Ordering::SeqCst);
            entry.abort.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counter() -> (Arc<AtomicUsize>, TimerTask) {
        let count = Arc::new(AtomicUsize::new(0));
        let clone = count.clone();
        let task: TimerTask = Box::new(move || {
            clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, task)
    }

    #[test]
    fn test_requires_runtime() {
        assert!(matches!(TokioClock::new(), Err(ClockError::NoRuntime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_after_delay() {
        let clock = TokioClock::new().unwrap();
        let (count, task) = counter();
        clock.schedule_once(Duration::from_millis(100), task);

        sleep(Duration::from_millis(99)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(clock.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_and_cancel() {
        let clock = TokioClock::new().unwrap();
        let (count, task) = counter();
        let handle = clock.schedule_repeating(Duration::from_secs(1), task);

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        clock.cancel(handle);
        sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(clock.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_fire() {
        let clock = TokioClock::new().unwrap();
        let (count, task) = counter();
        let handle = clock.schedule_once(Duration::from_millis(50), task);

        clock.cancel(handle);
        sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_now_tracks_runtime_time() {
        let clock = TokioClock::new().unwrap();
        sleep(Duration::from_secs(2)).await;
        assert!(clock.now() >= Duration::from_secs(2));
    }
}
