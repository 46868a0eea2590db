//! Tempo Clock Infrastructure
//!
//! Implementations of the [`Clock`] port:
//!
//! - [`ManualClock`]: virtual time, moved explicitly (tests, simulations)
//! - [`TokioClock`]: real time, timers run as tokio tasks
//!
//! ## Usage
//!
//! ```ignore
//! use tempo_clock::{Clock, ManualClock};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! clock.schedule_once(Duration::from_millis(100), Box::new(|| println!("fired")));
//!
//! clock.advance(Duration::from_millis(100)); // prints "fired"
//! clock.run_all(10)?;                        // drain whatever is left
//! ```

mod error;
mod manual;
mod runtime;

pub use error::{ClockError, ClockResult};
pub use manual::{MIN_PERIOD, ManualClock};
pub use runtime::TokioClock;

// Re-export the Clock port for convenience
pub use tempo_ports::{Clock, TimerHandle, TimerTask};
