//! Tempo Ports
//!
//! Port definitions (traits) for tempo nodes.
//! These define the boundaries between the engines and the host running them.

mod clock;
mod node;

pub use clock::{Clock, TimerHandle, TimerTask};
pub use node::{DoneCallback, Envelope, ErrorReporter, Node, NodeContext, OutputSender};

// Re-export configuration errors, reported through the same ports
pub use tempo_core::{ConfigError, ConfigResult};
