use crate::error::ConfigError;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

/// Wall-clock time with minute precision on a single local clock.
///
/// Ordering is lexicographic on `(hour, minute)`; there is no notion of a
/// window wrapping past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: Self = Self { hour: 0, minute: 0 };

    pub fn new(hour: u32, minute: u32) -> Result<Self, ConfigError> {
        if hour > 23 || minute > 59 {
            return Err(ConfigError::InvalidTime { hour, minute });
        }
        Ok(Self {
            hour: u8::try_from(hour).map_err(|_| ConfigError::InvalidTime { hour, minute })?,
            minute: u8::try_from(minute).map_err(|_| ConfigError::InvalidTime { hour, minute })?,
        })
    }

    pub fn hour(self) -> u32 {
        u32::from(self.hour)
    }

    pub fn minute(self) -> u32 {
        u32::from(self.minute)
    }

    /// Minutes since midnight.
    pub fn minute_of_day(self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    /// Inverse of [`TimeOfDay::minute_of_day`], wrapping at 24h.
    pub fn from_minute_of_day(minutes: u32) -> Self {
        let minutes = minutes % (24 * 60);
        Self {
            hour: u8::try_from(minutes / 60).unwrap_or(0),
            minute: u8::try_from(minutes % 60).unwrap_or(0),
        }
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self::from_minute_of_day(time.hour() * 60 + time.minute())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = ConfigError;

    /// Parses `HH:MM` (one- or two-digit hour).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::Validation(format!("expected HH:MM, got '{s}'"));
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

/// Source of the current local time of day.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> TimeOfDay;
}

/// Host local clock.
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> TimeOfDay {
        TimeOfDay::from(chrono::Local::now().time())
    }
}

/// Settable clock for deterministic evaluation (tests, replays).
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<TimeOfDay>,
}

impl FixedClock {
    pub fn new(now: TimeOfDay) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn at(hour: u32, minute: u32) -> Result<Self, ConfigError> {
        Ok(Self::new(TimeOfDay::new(hour, minute)?))
    }

    pub fn set(&self, now: TimeOfDay) {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }
}

impl TimeSource for FixedClock {
    fn now(&self) -> TimeOfDay {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_hour_then_minute() {
        let a = TimeOfDay::new(6, 59).unwrap();
        let b = TimeOfDay::new(7, 0).unwrap();
        assert!(a < b);
        assert!(TimeOfDay::new(7, 1).unwrap() > b);
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(TimeOfDay::new(24, 0).is_err());
        assert!(TimeOfDay::new(0, 60).is_err());
        assert!(TimeOfDay::new(23, 59).is_ok());
    }

    #[test]
    fn parses_and_displays_zero_padded() {
        let t: TimeOfDay = "6:05".parse().unwrap();
        assert_eq!(t.to_string(), "06:05");
        assert!("0800".parse::<TimeOfDay>().is_err());
        assert!("25:00".parse::<TimeOfDay>().is_err());
    }

    #[test]
    fn naive_time_truncates_seconds() {
        let t = NaiveTime::from_hms_opt(7, 59, 59).unwrap();
        assert_eq!(TimeOfDay::from(t), TimeOfDay::new(7, 59).unwrap());
    }

    #[test]
    fn minute_of_day_round_trips_every_minute() {
        for minute in 0..24 * 60 {
            assert_eq!(TimeOfDay::from_minute_of_day(minute).minute_of_day(), minute);
        }
    }

    #[test]
    fn fixed_clock_can_be_moved() {
        let clock = FixedClock::at(6, 0).unwrap();
        clock.set(TimeOfDay::new(8, 0).unwrap());
        assert_eq!(clock.now(), TimeOfDay::new(8, 0).unwrap());
    }
}
