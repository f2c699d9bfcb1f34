// ABOUTME: Deadline-bounded polling helper shared by every wait loop.
// ABOUTME: Centralizes interval, timeout, and transient-error handling.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Longest budget a single polling loop may be given.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Interval and overall budget for a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The awaited condition holds.
    Ready(T),
    /// An explicit failure signal; polling stops regardless of remaining budget.
    Failed(T),
    /// Not there yet. The string describes the last-seen state for diagnostics.
    Pending(String),
}

/// Terminal result of a polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Success(T),
    Failure(T),
    TimedOut {
        elapsed: Duration,
        last_seen: Option<String>,
    },
}

impl<T> PollOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, PollOutcome::Success(_))
    }
}

/// Probe repeatedly until it reports ready or failed, or the timeout elapses.
///
/// The first probe runs immediately. Between probes the loop sleeps for
/// `settings.interval`, shortened so that one final probe lands exactly on the
/// deadline. Probe errors are transient: they are logged and polling
/// continues. Only the deadline ends the loop without a verdict.
pub async fn poll_until<F, Fut, T, E>(
    operation: &str,
    settings: PollSettings,
    mut probe: F,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe<T>, E>>,
    E: Display,
{
    let start = Instant::now();
    let deadline = start + settings.timeout.min(MAX_TIMEOUT);
    let mut attempt = 0u32;

    let last_seen = loop {
        attempt += 1;

        let seen = match probe().await {
            Ok(Probe::Ready(value)) => {
                tracing::debug!(
                    operation,
                    attempt,
                    elapsed_secs = start.elapsed().as_secs(),
                    "poll condition met"
                );
                return PollOutcome::Success(value);
            }
            Ok(Probe::Failed(value)) => {
                tracing::warn!(
                    operation,
                    attempt,
                    elapsed_secs = start.elapsed().as_secs(),
                    "poll observed failure"
                );
                return PollOutcome::Failure(value);
            }
            Ok(Probe::Pending(state)) => {
                tracing::info!(operation, attempt, state = %state, "waiting");
                state
            }
            Err(e) => {
                tracing::warn!(operation, attempt, error = %e, "probe failed, retrying");
                format!("error: {e}")
            }
        };

        let now = Instant::now();
        if now >= deadline {
            break seen;
        }
        tokio::time::sleep(settings.interval.min(deadline - now)).await;
    };

    let elapsed = start.elapsed();
    tracing::error!(
        operation,
        attempts = attempt,
        elapsed_secs = elapsed.as_secs(),
        last_seen = %last_seen,
        "timed out"
    );
    PollOutcome::TimedOut {
        elapsed,
        last_seen: Some(last_seen),
    }
}
