//! Tempo Countdown
//!
//! A cancellable, restartable countdown driven by boolean signals:
//!
//! - **Engine**: the tick / complete / cancel state machine, on any [`Clock`](tempo_ports::Clock)
//! - **Node**: host adapter routing notifications to three output channels
//!
//! ## Signals
//!
//! ```text
//! true  ─► start (or restart, if restartOnSecondMessage)
//! false ─► cancel the running countdown
//! other ─► ignored
//! ```

pub mod engine;
pub mod node;

pub use engine::{
    CountdownEngine, CountdownEvent, CountdownListener, DEFAULT_TICK_PERIOD, IDLE, SignalOutcome,
};
pub use node::{
    CANCEL_PORT, COMPLETE_PORT, COUNTDOWN_CANCELLED, COUNTDOWN_ENDED, COUNTDOWN_NODE_TYPE,
    CountdownNode, OUTPUT_COUNT, TICK_PORT,
};
