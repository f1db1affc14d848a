use std::time::Duration;
use tracing::{debug, info};

use crate::http::{instance_identity, Fetched, HttpChecker};
use crate::report::LbStatus;
use crate::state::{DistributionOutcome, ProbeSample, UNKNOWN_INSTANCE};

/// Samples the front door a fixed number of times and records which backend
/// answered each trial. With few trials a balancer can look `PARTIAL` by
/// chance; that is accepted.
pub struct DistributionProber {
    checker: HttpChecker,
    trials: u32,
    trial_delay: Duration,
    timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct ProbeRun {
    pub samples: Vec<ProbeSample>,
    pub outcome: DistributionOutcome,
}

impl ProbeRun {
    pub fn lb_status(&self) -> LbStatus {
        classify(&self.outcome)
    }
}

impl DistributionProber {
    pub fn new(checker: HttpChecker, trials: u32, trial_delay: Duration, timeout: Duration) -> Self {
        Self {
            checker,
            trials,
            trial_delay,
            timeout,
        }
    }

    pub async fn run(&self, front_door: &str) -> ProbeRun {
        let mut samples = Vec::with_capacity(self.trials as usize);

        for trial_index in 1..=self.trials {
            let sample = self.trial(front_door, trial_index).await;
            debug!(trial = trial_index, instance = %sample.instance_id, "probe trial");
            samples.push(sample);

            if trial_index < self.trials {
                tokio::time::sleep(self.trial_delay).await;
            }
        }

        let outcome = DistributionOutcome::from_samples(&samples);
        info!(
            distinct = outcome.distinct_instances.len(),
            failed = outcome.failed_count,
            "load distribution probe finished"
        );
        ProbeRun { samples, outcome }
    }

    async fn trial(&self, front_door: &str, trial_index: u32) -> ProbeSample {
        match self.checker.fetch(front_door, self.timeout).await {
            Fetched::Success { body, .. } => {
                let instance_id = body
                    .as_ref()
                    .and_then(|value| instance_identity(value, self.checker.instance_field()))
                    .unwrap_or_else(|| UNKNOWN_INSTANCE.to_string());
                ProbeSample {
                    trial_index,
                    instance_id,
                }
            }
            Fetched::Failure { message, .. } => {
                debug!(trial = trial_index, url = front_door, error = %message, "probe trial failed");
                ProbeSample::failed(trial_index)
            }
        }
    }
}

pub fn classify(outcome: &DistributionOutcome) -> LbStatus {
    match outcome.distinct_instances.len() {
        0 => LbStatus::NotWorking,
        1 => LbStatus::Partial,
        _ => LbStatus::Working,
    }
}
