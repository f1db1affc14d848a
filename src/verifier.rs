use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

use crate::backoff::Backoff;
use crate::compose::ComposeRunner;
use crate::config::{preflight, validate_config, validate_probe};
use crate::error::Result;
use crate::http::HttpChecker;
use crate::models::VerifierConfig;
use crate::poller::{PollOutcome, ReadinessPoller};
use crate::prober::{DistributionProber, ProbeRun};
use crate::report::SystemReport;
use crate::state::{DistributionOutcome, EndpointTarget, HealthResult, ProbeSample};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollMode {
    #[default]
    WaitForReady,
    OneShot,
}

/// What to do with the fleet before checking it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeployPlan {
    pub clean: bool,
    pub bring_up: bool,
    pub build: bool,
}

impl DeployPlan {
    pub fn is_active(&self) -> bool {
        self.clean || self.bring_up
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RunOptions {
    pub mode: PollMode,
    pub deploy: DeployPlan,
}

/// Everything one run produced, ready for a formatter.
#[derive(Clone, Debug, Serialize)]
pub struct Verification {
    pub mode: PollMode,
    pub front_door: String,
    pub report: SystemReport,
    pub targets: Vec<HealthResult>,
    pub samples: Vec<ProbeSample>,
    pub distribution: DistributionOutcome,
}

impl Verification {
    pub fn failing_critical(&self) -> impl Iterator<Item = &HealthResult> {
        self.targets
            .iter()
            .filter(|result| result.target.critical && !result.is_healthy())
    }
}

pub async fn verify(config: &VerifierConfig, options: &RunOptions) -> Result<Verification> {
    validate_config(config)?;
    let started = Instant::now();

    if options.deploy.is_active() {
        preflight(&config.deploy)?;
        let runner = ComposeRunner::from_config(&config.deploy)?;
        if options.deploy.clean {
            runner.down(true).await?;
        }
        runner.up(options.deploy.build).await?;
    }

    let checker = HttpChecker::new(config.probe.instance_field.clone())?;
    let targets: Vec<EndpointTarget> = config.targets.iter().map(EndpointTarget::from).collect();

    let poll = poll_targets(&checker, config, options.mode, &targets).await;
    let probe = probe_with(&checker, config).await;
    let report = SystemReport::build(&poll, &probe.outcome, started.elapsed());

    info!(
        tier = %report.status_tier,
        lb = %report.lb_status,
        success = report.success,
        "verification finished"
    );

    Ok(Verification {
        mode: options.mode,
        front_door: config.probe.front_door.clone(),
        report,
        targets: poll.results,
        samples: probe.samples,
        distribution: probe.outcome,
    })
}

pub async fn probe(config: &VerifierConfig) -> Result<ProbeRun> {
    validate_probe(config)?;
    let checker = HttpChecker::new(config.probe.instance_field.clone())?;
    Ok(probe_with(&checker, config).await)
}

async fn poll_targets(
    checker: &HttpChecker,
    config: &VerifierConfig,
    mode: PollMode,
    targets: &[EndpointTarget],
) -> PollOutcome {
    match mode {
        PollMode::OneShot => {
            ReadinessPoller::new(
                checker.clone(),
                Duration::from_secs(config.poll.one_shot_timeout_secs),
            )
            .with_parallel(config.poll.parallel)
            .poll_once(targets)
            .await
        }
        PollMode::WaitForReady => {
            let backoff = Backoff::new(
                config.poll.attempts,
                Duration::from_secs(config.poll.backoff_step_secs),
                Duration::from_secs(config.poll.backoff_cap_secs),
            );
            ReadinessPoller::new(checker.clone(), Duration::from_secs(config.poll.timeout_secs))
                .with_parallel(config.poll.parallel)
                .wait_until_ready(targets, backoff)
                .await
        }
    }
}

async fn probe_with(checker: &HttpChecker, config: &VerifierConfig) -> ProbeRun {
    DistributionProber::new(
        checker.clone(),
        config.probe.trials,
        Duration::from_millis(config.probe.trial_delay_ms),
        Duration::from_secs(config.probe.timeout_secs),
    )
    .run(&config.probe.front_door)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::models::{DeployConfig, TargetConfig};
    use crate::report::{LbStatus, StatusTier};
    use serde_json::json;
    use std::path::PathBuf;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_config(server: &MockServer, healthy: usize, failing: usize) -> VerifierConfig {
        let mut config = VerifierConfig::default();
        config.targets = (0..healthy)
            .map(|idx| TargetConfig {
                name: format!("ok-{}", idx),
                url: format!("{}/ok", server.uri()),
                critical: true,
            })
            .chain((0..failing).map(|idx| TargetConfig {
                name: format!("down-{}", idx),
                url: format!("{}/down", server.uri()),
                critical: true,
            }))
            .collect();
        config.poll.attempts = 3;
        config.poll.backoff_step_secs = 0;
        config.poll.backoff_cap_secs = 0;
        config.probe.front_door = format!("{}/lb", server.uri());
        config.probe.trial_delay_ms = 0;
        config
    }

    async fn fleet(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(server)
            .await;
        for id in ["i1", "i2", "i1", "i2", "i1"] {
            Mock::given(method("GET"))
                .and(path("/lb"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"instance_id": id})))
                .up_to_n_times(1)
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn healthy_fleet_is_perfect_and_working() {
        let server = MockServer::start().await;
        fleet(&server).await;

        let verification = verify(&fast_config(&server, 11, 0), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(verification.report.status_tier, StatusTier::Perfect);
        assert_eq!(verification.report.lb_status, LbStatus::Working);
        assert_eq!(verification.report.attempts, 1);
        assert_eq!(verification.samples.len(), 5);
        assert!(verification.report.success);
    }

    #[tokio::test]
    async fn one_failing_critical_exhausts_attempts() {
        let server = MockServer::start().await;
        fleet(&server).await;

        let verification = verify(&fast_config(&server, 10, 1), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(verification.report.attempts, 3);
        assert_eq!(verification.report.health_percentage, 90.9);
        assert_eq!(verification.report.status_tier, StatusTier::Excellent);
        assert!(!verification.report.success);
        let failing: Vec<&str> = verification
            .failing_critical()
            .map(|result| result.target.name.as_str())
            .collect();
        assert_eq!(failing, vec!["down-0"]);
    }

    #[tokio::test]
    async fn one_shot_mode_sweeps_once() {
        let server = MockServer::start().await;
        fleet(&server).await;

        let options = RunOptions {
            mode: PollMode::OneShot,
            ..RunOptions::default()
        };
        let verification = verify(&fast_config(&server, 1, 1), &options).await.unwrap();
        assert_eq!(verification.report.attempts, 1);
        assert_eq!(verification.report.status_tier, StatusTier::NeedsAttention);
    }

    #[tokio::test]
    async fn deploy_with_missing_compose_file_fails_before_polling() {
        let server = MockServer::start().await;
        let mut config = fast_config(&server, 1, 0);
        config.deploy = DeployConfig {
            compose_file: PathBuf::from("/nonexistent/docker-compose.yml"),
            ..DeployConfig::default()
        };
        let options = RunOptions {
            deploy: DeployPlan {
                bring_up: true,
                ..DeployPlan::default()
            },
            ..RunOptions::default()
        };

        let err = verify(&config, &options).await.unwrap_err();
        assert!(matches!(err, Error::MissingArtifact(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
