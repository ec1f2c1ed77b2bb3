use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The trailing window over which performance metrics are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "7D")]
    SevenDays,
    #[serde(rename = "30D")]
    ThirtyDays,
    #[serde(rename = "ALL")]
    All,
}

impl Window {
    /// The duration the window spans, or `None` for the full curve.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Window::OneDay => Some(Duration::days(1)),
            Window::SevenDays => Some(Duration::days(7)),
            Window::ThirtyDays => Some(Duration::days(30)),
            Window::All => None,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Window::OneDay => "1D",
            Window::SevenDays => "7D",
            Window::ThirtyDays => "30D",
            Window::All => "ALL",
        };
        write!(f, "{}", s)
    }
}

/// Raised when a caller supplies a window selector outside the enumerated set.
/// This is a caller-input error, not an engine fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid window '{0}'. Must be one of: 1D, 7D, 30D, ALL")]
pub struct ParseWindowError(pub String);

impl FromStr for Window {
    type Err = ParseWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "1D" => Ok(Window::OneDay),
            "7D" => Ok(Window::SevenDays),
            "30D" => Ok(Window::ThirtyDays),
            "ALL" => Ok(Window::All),
            other => Err(ParseWindowError(other.to_string())),
        }
    }
}

/// The classified bias of an allocation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    /// Mean lending weight above 0.6: the strategy leans on stable yield.
    LendingFocused,
    /// Mean LP weight above 0.6: the strategy chases fee income.
    LpFocused,
    Balanced,
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Preference::LendingFocused => "lending_focused",
            Preference::LpFocused => "lp_focused",
            Preference::Balanced => "balanced",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_parses_case_insensitively() {
        assert_eq!("7d".parse::<Window>().unwrap(), Window::SevenDays);
        assert_eq!("ALL".parse::<Window>().unwrap(), Window::All);
    }

    #[test]
    fn window_rejects_unknown_selector() {
        let err = "90D".parse::<Window>().unwrap_err();
        assert_eq!(err, ParseWindowError("90D".to_string()));
    }

    #[test]
    fn window_display_round_trips() {
        for w in [Window::OneDay, Window::SevenDays, Window::ThirtyDays, Window::All] {
            assert_eq!(w.to_string().parse::<Window>().unwrap(), w);
        }
    }
}
