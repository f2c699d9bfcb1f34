// ABOUTME: Polling intervals and timeout budgets for the deployment state machine.
// ABOUTME: Defaults: 10m rollout, 5m health, 2m post-switch, 30s polls, 60s settle.

use serde::Deserialize;
use std::time::Duration;

use crate::poll::{MAX_TIMEOUT, PollSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeoutSettings {
    #[serde(default = "default_rollout", with = "humantime_serde")]
    pub rollout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub rollout_poll_interval: Duration,

    #[serde(default = "default_health", with = "humantime_serde")]
    pub health: Duration,

    #[serde(default = "default_post_switch_health", with = "humantime_serde")]
    pub post_switch_health: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub health_poll_interval: Duration,

    #[serde(default = "default_settle_period", with = "humantime_serde")]
    pub settle_period: Duration,
}

fn default_rollout() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_health() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_post_switch_health() -> Duration {
    Duration::from_secs(2 * 60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_settle_period() -> Duration {
    Duration::from_secs(60)
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        TimeoutSettings {
            rollout: default_rollout(),
            rollout_poll_interval: default_poll_interval(),
            health: default_health(),
            post_switch_health: default_post_switch_health(),
            health_poll_interval: default_poll_interval(),
            settle_period: default_settle_period(),
        }
    }
}

impl TimeoutSettings {
    /// Override the rollout budget, as `--timeout-minutes` / `TIMEOUT_MINUTES` do.
    ///
    /// `None` when the budget is zero or longer than `MAX_TIMEOUT`.
    pub fn with_rollout_minutes(mut self, minutes: u64) -> Option<Self> {
        self.rollout = minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .filter(|budget| !budget.is_zero() && *budget <= MAX_TIMEOUT)?;
        Some(self)
    }

    /// Name of the first wait budget longer than `MAX_TIMEOUT`, if any.
    pub fn oversized(&self) -> Option<&'static str> {
        [
            ("rollout", self.rollout),
            ("health", self.health),
            ("post_switch_health", self.post_switch_health),
            ("settle_period", self.settle_period),
        ]
        .into_iter()
        .find(|(_, budget)| *budget > MAX_TIMEOUT)
        .map(|(name, _)| name)
    }

    pub fn rollout_poll(&self) -> PollSettings {
        PollSettings::new(self.rollout_poll_interval, self.rollout)
    }

    /// Long wait for a freshly deployed slot to report healthy.
    pub fn health_poll(&self) -> PollSettings {
        PollSettings::new(self.health_poll_interval, self.health)
    }

    /// Short re-verification after traffic has moved.
    pub fn post_switch_poll(&self) -> PollSettings {
        PollSettings::new(self.health_poll_interval, self.post_switch_health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_budgets() {
        let t = TimeoutSettings::default();
        assert_eq!(t.rollout, Duration::from_secs(600));
        assert_eq!(t.health, Duration::from_secs(300));
        assert_eq!(t.post_switch_health, Duration::from_secs(120));
        assert_eq!(t.settle_period, Duration::from_secs(60));
        assert_eq!(t.health_poll().interval, Duration::from_secs(30));
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let t: TimeoutSettings = serde_yaml::from_str("rollout: 15m\nsettle_period: 5s").unwrap();
        assert_eq!(t.rollout, Duration::from_secs(900));
        assert_eq!(t.settle_period, Duration::from_secs(5));
        assert_eq!(t.health, Duration::from_secs(300));
    }

    #[test]
    fn rollout_minutes_are_bounded_to_a_day() {
        let t = TimeoutSettings::default();
        assert_eq!(
            t.with_rollout_minutes(24 * 60).map(|t| t.rollout),
            Some(Duration::from_secs(86_400))
        );
        assert_eq!(t.with_rollout_minutes(24 * 60 + 1), None);
        assert_eq!(t.with_rollout_minutes(0), None);
        assert_eq!(t.with_rollout_minutes(u64::MAX), None);
    }

    #[test]
    fn oversized_names_the_offending_budget() {
        assert_eq!(TimeoutSettings::default().oversized(), None);

        let t: TimeoutSettings = serde_yaml::from_str("settle_period: 2days").unwrap();
        assert_eq!(t.oversized(), Some("settle_period"));
    }
}
