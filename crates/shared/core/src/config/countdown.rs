use serde::{Deserialize, Serialize};

use super::{ConfigError, ConfigResult, Numeral};

/// Countdown settings as they appear in a flow definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownSettings {
    #[serde(default)]
    pub countdown_from: Option<Numeral>,
    #[serde(default)]
    pub restart_on_second_message: bool,
}

/// Validated countdown configuration, immutable per node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownConfig {
    count_from: u32,
    restart_on_second_message: bool,
}

impl CountdownConfig {
    /// Create a configuration, rejecting a start value below 1
    pub fn new(count_from: i64, restart_on_second_message: bool) -> ConfigResult<Self> {
        let count_from = u32::try_from(count_from)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| ConfigError::InvalidCountdownFrom(count_from.to_string()))?;

        Ok(Self {
            count_from,
            restart_on_second_message,
        })
    }

    /// Validate raw settings from a flow definition
    pub fn from_settings(settings: &CountdownSettings) -> ConfigResult<Self> {
        let raw = settings
            .countdown_from
            .as_ref()
            .ok_or(ConfigError::MissingCountdownFrom)?;
        let count_from = raw
            .to_integer()
            .ok_or_else(|| ConfigError::InvalidCountdownFrom(raw.to_string()))?;

        Self::new(count_from, settings.restart_on_second_message)
    }

    /// Value of the first tick of every run
    pub fn count_from(&self) -> u32 {
        self.count_from
    }

    /// Whether a start signal during a run restarts it
    pub fn restart_on_second_message(&self) -> bool {
        self.restart_on_second_message
    }
}
