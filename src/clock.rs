// ABOUTME: Wall-clock abstraction for time-dependent policy.
// ABOUTME: SystemClock reads the host clock; FixedClock pins a time for what-if checks and tests.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("system clock is before the Unix epoch")]
    BeforeEpoch,

    #[error("system clock is out of range")]
    OutOfRange,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Result<DateTime<Utc>, ClockError>;
}

/// The host's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<DateTime<Utc>, ClockError> {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| ClockError::BeforeEpoch)?;
        let secs = i64::try_from(since_epoch.as_secs()).map_err(|_| ClockError::OutOfRange)?;
        DateTime::from_timestamp(secs, since_epoch.subsec_nanos()).ok_or(ClockError::OutOfRange)
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> Result<DateTime<Utc>, ClockError> {
        Ok(self.0)
    }
}
