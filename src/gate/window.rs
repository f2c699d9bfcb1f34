// ABOUTME: Production deployment-window policy: business hours, no Friday afternoons, no weekends.
// ABOUTME: Evaluated in a fixed UTC offset so the verdict does not depend on the host timezone.

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc, Weekday};
use serde::Deserialize;
use thiserror::Error;

/// Hours are local to `utc_offset_hours`. The window is `[start_hour, end_hour)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowPolicy {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    /// On Fridays, deployments stop at this hour.
    #[serde(default = "default_friday_cutoff_hour")]
    pub friday_cutoff_hour: u32,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_start_hour() -> u32 {
    9
}

fn default_end_hour() -> u32 {
    18
}

fn default_friday_cutoff_hour() -> u32 {
    15
}

// KST
fn default_utc_offset_hours() -> i32 {
    9
}

impl Default for WindowPolicy {
    fn default() -> Self {
        WindowPolicy {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            friday_cutoff_hour: default_friday_cutoff_hour(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

/// Why the window is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    OutsideBusinessHours,
    FridayAfternoon,
    Weekend,
}

impl WindowViolation {
    pub fn message(self) -> &'static str {
        match self {
            WindowViolation::OutsideBusinessHours => "Outside deployment window",
            WindowViolation::FridayAfternoon => "Friday afternoon deployment",
            WindowViolation::Weekend => "Weekend deployment",
        }
    }
}

/// The policy itself could not be evaluated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("invalid UTC offset: {0} hours")]
    InvalidOffset(i32),
}

impl WindowPolicy {
    fn offset(&self) -> Result<FixedOffset, WindowError> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or(WindowError::InvalidOffset(self.utc_offset_hours))
    }

    /// `Ok(None)` when `now` is inside the window.
    ///
    /// Business hours are checked before the Friday cutoff, then weekends, so a
    /// Saturday evening reports `OutsideBusinessHours`.
    pub fn evaluate(&self, now: DateTime<Utc>) -> Result<Option<WindowViolation>, WindowError> {
        let local = now.with_timezone(&self.offset()?);
        let hour = local.hour();

        if hour < self.start_hour || hour >= self.end_hour {
            return Ok(Some(WindowViolation::OutsideBusinessHours));
        }
        if local.weekday() == Weekday::Fri && hour >= self.friday_cutoff_hour {
            return Ok(Some(WindowViolation::FridayAfternoon));
        }
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return Ok(Some(WindowViolation::Weekend));
        }
        Ok(None)
    }

    /// Human-readable description of the window, for log lines.
    pub fn describe(&self) -> String {
        format!(
            "{:02}:00-{:02}:00 UTC{:+}, Fridays until {:02}:00, no weekends",
            self.start_hour, self.end_hour, self.utc_offset_hours, self.friday_cutoff_hour
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-03-02 is a Monday.
    fn kst(day: u32, hour: u32) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("2026-03-{day:02}T{hour:02}:30:00+09:00"))
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn weekday_business_hours_are_open() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.evaluate(kst(2, 9)), Ok(None));
        assert_eq!(policy.evaluate(kst(4, 17)), Ok(None));
    }

    #[test]
    fn evening_is_outside_window() {
        let policy = WindowPolicy::default();
        assert_eq!(
            policy.evaluate(kst(3, 20)),
            Ok(Some(WindowViolation::OutsideBusinessHours))
        );
        assert_eq!(
            policy.evaluate(kst(3, 18)),
            Ok(Some(WindowViolation::OutsideBusinessHours))
        );
    }

    #[test]
    fn friday_cutoff_applies_from_fifteen() {
        let policy = WindowPolicy::default();
        assert_eq!(policy.evaluate(kst(6, 14)), Ok(None));
        assert_eq!(
            policy.evaluate(kst(6, 15)),
            Ok(Some(WindowViolation::FridayAfternoon))
        );
    }

    #[test]
    fn weekend_daytime_is_closed() {
        let policy = WindowPolicy::default();
        assert_eq!(
            policy.evaluate(kst(7, 11)),
            Ok(Some(WindowViolation::Weekend))
        );
        assert_eq!(
            policy.evaluate(kst(8, 11)),
            Ok(Some(WindowViolation::Weekend))
        );
    }

    #[test]
    fn offset_shifts_the_window() {
        let utc = WindowPolicy {
            utc_offset_hours: 0,
            ..WindowPolicy::default()
        };
        // 10:30 KST Monday is 01:30 UTC.
        assert_eq!(
            utc.evaluate(kst(2, 10)),
            Ok(Some(WindowViolation::OutsideBusinessHours))
        );
    }

    #[test]
    fn absurd_offset_is_an_error() {
        let policy = WindowPolicy {
            utc_offset_hours: 30,
            ..WindowPolicy::default()
        };
        assert_eq!(
            policy.evaluate(kst(2, 10)),
            Err(WindowError::InvalidOffset(30))
        );
    }
}
