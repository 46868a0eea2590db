//! Tempo Core Domain
//!
//! Pure domain types shared by tempo nodes and their host.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod config;
pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use config::{
    ConfigError, ConfigResult, CountdownConfig, CountdownSettings, DebounceSettings, Numeral,
};
pub use entities::{Message, Outputs, on_port};
pub use values::{MessageId, NodeId, Port};
