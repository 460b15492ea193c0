//! The per-task retry schedule, modeled as an explicit state machine.

use std::time::Duration;

use rand::Rng;

use vela_core::{BackoffConfig, SyncError};

/// Where one task's retry loop currently stands.
///
/// `Idle → Attempting → Backoff → Attempting → … → Exhausted`. The schedule
/// is pure: the executor owns the clock and the sleeps, so every transition
/// is testable without time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// No attempt launched yet.
    Idle,
    /// An attempt is in flight.
    Attempting {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// Waiting out a delay before the next attempt.
    Backoff {
        /// Attempt that just failed.
        attempt: u32,
        /// Delay to wait before relaunching.
        delay: Duration,
    },
    /// The attempt budget is spent or the failure was not retryable.
    Exhausted,
}

/// What the executor should do after reporting a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Sleep for the delay, then launch the next attempt.
    RetryAfter(Duration),
    /// Stop; the task failed terminally.
    GiveUp,
}

/// Retry schedule for a single fetch task.
#[derive(Debug)]
pub struct RetrySchedule {
    state: RetryState,
    max_attempts: u32,
    backoff: BackoffConfig,
    default_cooldown: Duration,
}

impl RetrySchedule {
    /// Fresh schedule in `Idle`.
    #[must_use]
    pub const fn new(
        max_attempts: u32,
        backoff: BackoffConfig,
        default_cooldown: Duration,
    ) -> Self {
        Self {
            state: RetryState::Idle,
            max_attempts,
            backoff,
            default_cooldown,
        }
    }

    /// Current state, for logging and tests.
    #[must_use]
    pub const fn state(&self) -> RetryState {
        self.state
    }

    /// Move into `Attempting` and return the 1-based attempt number, or
    /// `None` when the schedule is already exhausted.
    pub fn begin(&mut self) -> Option<u32> {
        let attempt = match self.state {
            RetryState::Idle => 1,
            RetryState::Backoff { attempt, .. } => attempt + 1,
            RetryState::Attempting { attempt } => attempt,
            RetryState::Exhausted => return None,
        };
        self.state = RetryState::Attempting { attempt };
        Some(attempt)
    }

    /// Record a failed attempt and decide the next step.
    ///
    /// Rate-limit cooldowns come from the provider's hint or the configured
    /// default and count toward the attempt budget; transient failures back
    /// off exponentially with jitter; permanent failures and a spent budget
    /// exhaust the schedule.
    pub fn on_failure(&mut self, err: &SyncError) -> RetryStep {
        let RetryState::Attempting { attempt } = self.state else {
            self.state = RetryState::Exhausted;
            return RetryStep::GiveUp;
        };
        if !err.is_retryable() || attempt >= self.max_attempts {
            self.state = RetryState::Exhausted;
            return RetryStep::GiveUp;
        }
        let delay = match err {
            SyncError::RateLimited { retry_after_ms, .. } => retry_after_ms
                .map_or(self.default_cooldown, Duration::from_millis),
            _ => self.transient_delay(attempt),
        };
        self.state = RetryState::Backoff { attempt, delay };
        RetryStep::RetryAfter(delay)
    }

    fn transient_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self
            .backoff
            .base_ms
            .saturating_mul(u64::from(self.backoff.factor).saturating_pow(exponent));
        Duration::from_millis(jittered(
            base.min(self.backoff.max_ms),
            self.backoff.jitter_percent,
        ))
    }
}

/// Add up to `jitter_percent` percent of random spread on top of `base_ms`.
#[must_use]
pub fn jittered(base_ms: u64, jitter_percent: u8) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100)
    };
    let mut rng = rand::rng();
    base_ms + rng.random_range(0..jitter_range)
}
