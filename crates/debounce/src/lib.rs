//! Tempo Debounce
//!
//! Coalesces bursts of messages: only the last message of a burst is
//! delivered, once no new message has arrived for the quiet period.
//!
//! ```text
//! in:   a  b   c              d
//!       │  │   │              │
//! out:  ───────────── c ─────────────── d
//!              └─quiet─┘      └─quiet─┘
//! ```

pub mod engine;
pub mod node;

pub use engine::{DebounceEngine, INFO_PROPERTY};
pub use node::{DEBOUNCE_NODE_TYPE, DebounceNode};
