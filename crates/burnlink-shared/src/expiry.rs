use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::constants::MAX_TTL_SECS;

/// How long a secret stays retrievable.
///
/// `Instant` is not a zero TTL: it keeps the 24-hour ceiling and marks the
/// envelope burn-after-read, so the first successful view deletes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExpiryOption {
    #[default]
    Instant,
    FiveMinutes,
    OneHour,
    TwelveHours,
    TwentyFourHours,
}

impl ExpiryOption {
    pub const ALL: [ExpiryOption; 5] = [
        Self::Instant,
        Self::FiveMinutes,
        Self::OneHour,
        Self::TwelveHours,
        Self::TwentyFourHours,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Instant => "Instant",
            Self::FiveMinutes => "5 minutes",
            Self::OneHour => "1 hour",
            Self::TwelveHours => "12 hours",
            Self::TwentyFourHours => "24 hours",
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        match self {
            Self::FiveMinutes => 300,
            Self::OneHour => 3_600,
            Self::TwelveHours => 43_200,
            Self::Instant | Self::TwentyFourHours => MAX_TTL_SECS,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs())
    }

    pub fn burn_after_read(&self) -> bool {
        matches!(self, Self::Instant)
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl()
    }
}

impl fmt::Display for ExpiryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown expiration option: {0}")]
pub struct UnknownExpiry(pub String);

impl FromStr for ExpiryOption {
    type Err = UnknownExpiry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|option| option.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownExpiry(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_roundtrip() {
        for option in ExpiryOption::ALL {
            assert_eq!(option.label().parse::<ExpiryOption>().unwrap(), option);
        }
        assert_eq!("5 Minutes".parse::<ExpiryOption>().unwrap(), ExpiryOption::FiveMinutes);
        assert!("1 week".parse::<ExpiryOption>().is_err());
    }

    #[test]
    fn test_ttls() {
        assert_eq!(ExpiryOption::FiveMinutes.ttl_secs(), 300);
        assert_eq!(ExpiryOption::OneHour.ttl_secs(), 3_600);
        assert_eq!(ExpiryOption::TwelveHours.ttl_secs(), 43_200);
        assert_eq!(ExpiryOption::TwentyFourHours.ttl_secs(), 86_400);
    }

    #[test]
    fn test_instant_keeps_ceiling_and_burns() {
        assert_eq!(ExpiryOption::Instant.ttl_secs(), MAX_TTL_SECS);
        assert!(ExpiryOption::Instant.burn_after_read());
        assert!(ExpiryOption::ALL[1..].iter().all(|o| !o.burn_after_read()));
    }

    #[test]
    fn test_default_is_instant() {
        assert_eq!(ExpiryOption::default(), ExpiryOption::Instant);
    }
}
