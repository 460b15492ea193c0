//! Sliding-window budget for provider calls.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Requests-per-window budget shared across the worker pool.
///
/// A window admits `limit` calls; once spent, [`RequestBudget::acquire`]
/// waits out the remainder of the window. Window boundaries stay aligned
/// even across idle stretches.
#[derive(Debug)]
pub struct RequestBudget {
    limit: u32,
    window: Duration,
    runtime: Mutex<BudgetRuntime>,
}

#[derive(Debug)]
struct BudgetRuntime {
    used: u32,
    window_start: Instant,
}

impl RequestBudget {
    /// Budget admitting `limit` calls per minute.
    #[must_use]
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Budget admitting `limit` calls per `window`.
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            runtime: Mutex::new(BudgetRuntime {
                used: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Calls still admitted in the current window.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        let mut rt = self.runtime.lock().expect("budget mutex poisoned");
        Self::roll_window(&mut rt, self.window, Instant::now());
        self.limit.saturating_sub(rt.used)
    }

    /// Wait until the budget admits one more call, then consume it.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => tokio::time::sleep(wait.max(Duration::from_millis(1))).await,
            }
        }
    }

    fn try_acquire(&self) -> Result<(), Duration> {
        let mut rt = self.runtime.lock().expect("budget mutex poisoned");
        let now = Instant::now();
        Self::roll_window(&mut rt, self.window, now);
        if rt.used < self.limit {
            rt.used += 1;
            Ok(())
        } else {
            Err(self.window.saturating_sub(now.duration_since(rt.window_start)))
        }
    }

    /// Advance `window_start` past elapsed whole windows so boundaries stay
    /// aligned even with gaps in usage.
    fn roll_window(rt: &mut BudgetRuntime, window: Duration, now: Instant) {
        let elapsed = now.duration_since(rt.window_start);
        if elapsed >= window {
            let windows_passed = elapsed.as_nanos() / window.as_nanos();
            let boundary_offset = Duration::from_nanos(
                u64::try_from(windows_passed.saturating_mul(window.as_nanos()))
                    .unwrap_or(u64::MAX),
            );
            rt.window_start += boundary_offset;
            rt.used = 0;
        }
    }
}
