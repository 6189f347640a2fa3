//! Error policy applied by the hosting adapters

use std::fmt;
use std::str::FromStr;

/// What a handler reports to its runtime when processing fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log the error and report success, so the event is not redelivered
    #[default]
    Suppress,
    /// Report the error, letting the runtime's retry policy apply
    Propagate,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suppress" => Ok(ErrorPolicy::Suppress),
            "propagate" => Ok(ErrorPolicy::Propagate),
            other => Err(format!(
                "unknown error policy '{}' (expected 'suppress' or 'propagate')",
                other
            )),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Suppress => write!(f, "suppress"),
            ErrorPolicy::Propagate => write!(f, "propagate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_policy() {
        assert_eq!("suppress".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Suppress));
        assert_eq!(" Propagate ".parse::<ErrorPolicy>(), Ok(ErrorPolicy::Propagate));
        assert!("retry".parse::<ErrorPolicy>().is_err());
    }

    #[test]
    fn test_default_suppresses() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Suppress);
    }
}
