//! Fetch execution: drive a plan's provider calls with retry, cooldown, and
//! a shared request budget.

use std::time::Duration;

use vela_core::{Bar, FetchTask, PriceProvider, SyncConfig, SyncError};

mod budget;
mod retry;

pub use budget::RequestBudget;
pub use retry::{RetrySchedule, RetryState, RetryStep, jittered};

/// Terminal result of one fetch task.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The task this outcome belongs to.
    pub task: FetchTask,
    /// Bars on success; the terminal classified error otherwise.
    pub result: Result<Vec<Bar>, SyncError>,
    /// Provider attempts consumed, including retries.
    pub attempts: u32,
}

/// Runs a plan's fetch tasks against the provider, strictly in planner
/// order within one asset.
pub struct FetchExecutor<'a> {
    provider: &'a dyn PriceProvider,
    budget: &'a RequestBudget,
    cfg: &'a SyncConfig,
}

impl<'a> FetchExecutor<'a> {
    /// Executor bound to one provider, budget, and configuration.
    #[must_use]
    pub const fn new(
        provider: &'a dyn PriceProvider,
        budget: &'a RequestBudget,
        cfg: &'a SyncConfig,
    ) -> Self {
        Self {
            provider,
            budget,
            cfg,
        }
    }

    /// Execute every non-consolidation task, in order.
    ///
    /// A task failing terminally never aborts the remaining tasks; the
    /// failure lands in that task's outcome and execution continues.
    pub async fn execute(&self, symbol: &str, tasks: &[FetchTask]) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks.iter().filter(|task| !task.is_consolidation()) {
            outcomes.push(self.run_task(symbol, task).await);
        }
        outcomes
    }

    async fn run_task(&self, symbol: &str, task: &FetchTask) -> FetchOutcome {
        let mut schedule = RetrySchedule::new(
            self.cfg.max_retry_attempts,
            self.cfg.backoff,
            Duration::from_millis(self.cfg.default_cooldown_ms),
        );
        let mut attempts = 0;
        let result = loop {
            let Some(attempt) = schedule.begin() else {
                break Err(SyncError::transient(
                    self.provider.name(),
                    "retry schedule exhausted before launch",
                ));
            };
            attempts = attempt;
            self.budget.acquire().await;
            match self.attempt(symbol, task).await {
                Ok(bars) => {
                    tracing::debug!(
                        symbol,
                        granularity = %task.granularity,
                        range = %task.range,
                        bars = bars.len(),
                        attempt,
                        "fetch succeeded"
                    );
                    break Ok(bars);
                }
                Err(err) => match schedule.on_failure(&err) {
                    RetryStep::RetryAfter(delay) => {
                        tracing::warn!(
                            symbol,
                            range = %task.range,
                            attempt,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %err,
                            "fetch attempt failed; backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryStep::GiveUp => {
                        tracing::warn!(symbol, range = %task.range, attempt, error = %err, "fetch task abandoned");
                        break Err(if err.is_retryable() {
                            SyncError::RetriesExhausted {
                                attempts: attempt,
                                last: Box::new(err),
                            }
                        } else {
                            err
                        });
                    }
                },
            }
        };
        FetchOutcome {
            task: *task,
            result,
            attempts,
        }
    }

    async fn attempt(&self, symbol: &str, task: &FetchTask) -> Result<Vec<Bar>, SyncError> {
        match tokio::time::timeout(
            self.cfg.provider_timeout,
            self.provider.fetch(symbol, task.granularity, task.range),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SyncError::transient(
                self.provider.name(),
                format!("no response within {:?}", self.cfg.provider_timeout),
            )),
        }
    }
}
