use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ConfigError, ConfigResult, Numeral};

/// Debounce settings as they appear in a flow definition
///
/// Kept raw: the debounce node validates them on first use, not at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebounceSettings {
    #[serde(default)]
    pub debounce_in_ms: Option<Numeral>,
}

impl DebounceSettings {
    pub fn new(debounce_in_ms: impl Into<Numeral>) -> Self {
        Self {
            debounce_in_ms: Some(debounce_in_ms.into()),
        }
    }

    /// Quiet period, if `debounceInMs` starts with a whole number >= 0
    pub fn quiet_period(&self) -> ConfigResult<Duration> {
        let raw = self.debounce_in_ms.as_ref();
        raw.and_then(Numeral::leading_integer)
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis)
            .ok_or_else(|| ConfigError::InvalidDebounce(raw.map(|n| n.to_string())))
    }
}
