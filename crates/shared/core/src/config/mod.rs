//! Node configuration
//!
//! Raw settings are deserialized straight from the flow definition (numbers
//! may arrive as numeral strings). Validated configs are built from them.

mod countdown;
mod debounce;
mod error;
mod numeral;

pub use countdown::{CountdownConfig, CountdownSettings};
pub use debounce::DebounceSettings;
pub use error::{ConfigError, ConfigResult};
pub use numeral::Numeral;
