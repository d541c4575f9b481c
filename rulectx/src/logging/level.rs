//! Log levels shared by contexts, loggers and accumulators.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of a log record, ordered from most verbose to least.
///
/// A context's verbosity is a threshold: records below it are suppressed.
/// `Nothing` sits above every real severity, so a context at `Nothing`
/// emits no records at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Every record, including internal chatter.
    Everything,
    /// Extra detail beyond debugging output.
    Extra,
    /// Fine-grained tracing.
    Fine,
    /// Debugging output.
    Debug,
    /// Informational records.
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
    /// Critical failures.
    Critical,
    /// Suppresses all records.
    Nothing,
}

impl LogLevel {
    /// Verbosity given to freshly constructed contexts.
    pub const DEFAULT_VERBOSITY: Self = Self::Info;

    /// Info and anything more severe.
    pub const ANY_INFO: Self = Self::Info;

    /// Warnings and anything more severe.
    pub const ANY_WARN: Self = Self::Warn;

    /// All levels, most verbose first.
    pub const ALL: [Self; 9] = [
        Self::Everything,
        Self::Extra,
        Self::Fine,
        Self::Debug,
        Self::Info,
        Self::Warn,
        Self::Error,
        Self::Critical,
        Self::Nothing,
    ];

    /// Returns true if a record at `self` passes the `threshold`.
    #[must_use]
    pub fn passes(self, threshold: Self) -> bool {
        self != Self::Nothing && threshold != Self::Nothing && self >= threshold
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Everything => "EVERYTHING",
            Self::Extra => "EXTRA",
            Self::Fine => "FINE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Nothing => "NOTHING",
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::DEFAULT_VERBOSITY
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EVERYTHING" | "ALL" => Ok(Self::Everything),
            "EXTRA" => Ok(Self::Extra),
            "FINE" => Ok(Self::Fine),
            "DEBUG" => Ok(Self::Debug),
            "INFO" | "ANYINFO" => Ok(Self::Info),
            "WARN" | "WARNING" | "ANYWARN" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            "NOTHING" | "NONE" | "OFF" => Ok(Self::Nothing),
            other => Err(ConfigError::InvalidLevel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Everything < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Critical < LogLevel::Nothing);
    }

    #[test]
    fn test_passes_threshold() {
        assert!(LogLevel::Error.passes(LogLevel::Warn));
        assert!(LogLevel::Warn.passes(LogLevel::ANY_WARN));
        assert!(!LogLevel::Info.passes(LogLevel::Warn));
    }

    #[test]
    fn test_nothing_suppresses_everything() {
        for level in LogLevel::ALL {
            assert!(!level.passes(LogLevel::Nothing));
        }
        assert!(!LogLevel::Nothing.passes(LogLevel::Everything));
    }

    #[test]
    fn test_parse() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("ANYWARN".parse::<LogLevel>().unwrap(), LogLevel::ANY_WARN);
        assert_eq!(" critical ".parse::<LogLevel>().unwrap(), LogLevel::Critical);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&LogLevel::Fine).unwrap();
        assert_eq!(json, "\"FINE\"");
        let level: LogLevel = serde_json::from_str("\"NOTHING\"").unwrap();
        assert_eq!(level, LogLevel::Nothing);
    }
}
