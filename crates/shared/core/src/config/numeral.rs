use serde::{Deserialize, Serialize};
use std::fmt;

/// A number as written in a node's configuration
///
/// Editors store numeric fields as strings (`"100"`), hand-written flows often
/// use plain JSON numbers. Both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeral {
    Number(serde_json::Number),
    Text(String),
}

impl Numeral {
    /// Parse as a whole number
    ///
    /// Text is trimmed and must be an optionally signed decimal integer.
    /// Numbers must be integral. Anything else yields `None`.
    pub fn to_integer(&self) -> Option<i64> {
        match self {
            Numeral::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Numeral::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    /// Parse the leading whole number, ignoring whatever follows it
    ///
    /// `"100ms"` reads as `100`, `" -5 "` as `-5`, and numbers are
    /// truncated. Text with no leading digits yields `None`.
    pub fn leading_integer(&self) -> Option<i64> {
        match self {
            Numeral::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
            Numeral::Text(s) => {
                let s = s.trim_start();
                let digits_from = usize::from(s.starts_with(['+', '-']));
                let end = s[digits_from..]
                    .find(|c: char| !c.is_ascii_digit())
                    .map_or(s.len(), |i| i + digits_from);
                if end == digits_from {
                    return None;
                }
                s[..end].parse::<i64>().ok()
            }
        }
    }
}

impl From<&str> for Numeral {
    fn from(s: &str) -> Self {
        Numeral::Text(s.to_string())
    }
}

impl From<i64> for Numeral {
    fn from(n: i64) -> Self {
        Numeral::Number(n.into())
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeral::Number(n) => write!(f, "{}", n),
            Numeral::Text(s) => write!(f, "{}", s),
        }
    }
}
