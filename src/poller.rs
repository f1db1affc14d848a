use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::http::HttpChecker;
use crate::state::{EndpointTarget, HealthResult};

/// One pass over every configured target.
#[derive(Clone, Debug)]
pub struct Sweep {
    pub results: Vec<HealthResult>,
}

impl Sweep {
    /// True when every critical target answered healthy in this sweep.
    pub fn all_critical_healthy(&self) -> bool {
        self.results
            .iter()
            .filter(|result| result.target.critical)
            .all(HealthResult::is_healthy)
    }

    pub fn healthy_critical(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.target.critical && result.is_healthy())
            .count()
    }

    pub fn critical_total(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.target.critical)
            .count()
    }
}

/// Terminal results of a poll, plus how it got there.
#[derive(Clone, Debug)]
pub struct PollOutcome {
    pub results: Vec<HealthResult>,
    pub attempts: u32,
    pub converged: bool,
}

impl PollOutcome {
    pub fn healthy_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.target.critical && result.is_healthy())
            .count()
    }

    pub fn total(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.target.critical)
            .count()
    }
}

pub struct ReadinessPoller {
    checker: HttpChecker,
    timeout: Duration,
    parallel: bool,
}

impl ReadinessPoller {
    pub fn new(checker: HttpChecker, timeout: Duration) -> Self {
        Self {
            checker,
            timeout,
            parallel: false,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub async fn sweep(&self, targets: &[EndpointTarget]) -> Sweep {
        let results = if self.parallel {
            join_all(
                targets
                    .iter()
                    .map(|target| self.checker.check(target, self.timeout)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(targets.len());
            for target in targets {
                results.push(self.checker.check(target, self.timeout).await);
            }
            results
        };

        for result in results.iter().filter(|result| !result.is_healthy()) {
            if result.target.critical {
                debug!(endpoint = %result.target.name, outcome = %result.outcome, "critical target not ready");
            } else {
                debug!(endpoint = %result.target.name, outcome = %result.outcome, "optional target not ready");
            }
        }

        Sweep { results }
    }

    /// Single sweep, no retries.
    pub async fn poll_once(&self, targets: &[EndpointTarget]) -> PollOutcome {
        let sweep = self.sweep(targets).await;
        let converged = sweep.all_critical_healthy();
        PollOutcome {
            results: sweep.results,
            attempts: 1,
            converged,
        }
    }

    /// Repeats full sweeps until every critical target is healthy in the same
    /// sweep or the attempt bound runs out. Only the last sweep is kept.
    pub async fn wait_until_ready(
        &self,
        targets: &[EndpointTarget],
        backoff: Backoff,
    ) -> PollOutcome {
        let mut last = Sweep {
            results: Vec::new(),
        };
        let mut attempts = 0;

        for attempt in backoff {
            attempts = attempt.number;
            last = self.sweep(targets).await;

            if last.all_critical_healthy() {
                info!(attempt = attempt.number, "all critical targets healthy");
                return PollOutcome {
                    results: last.results,
                    attempts,
                    converged: true,
                };
            }

            info!(
                attempt = attempt.number,
                max_attempts = backoff.max_attempts,
                healthy = last.healthy_critical(),
                total = last.critical_total(),
                "fleet not ready yet"
            );

            if !attempt.is_last(&backoff) {
                tokio::time::sleep(attempt.delay_before_next).await;
            }
        }

        warn!(attempts, "attempt bound reached before all critical targets were healthy");
        PollOutcome {
            results: last.results,
            attempts,
            converged: false,
        }
    }
}
