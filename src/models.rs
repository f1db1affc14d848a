use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct VerifierConfig {
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            poll: PollConfig::default(),
            probe: ProbeConfig::default(),
            deploy: DeployConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct TargetConfig {
    pub name: String,
    pub url: String,
    #[serde(default = "default_critical")]
    pub critical: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollConfig {
    /// Upper bound on full sweeps in wait-for-ready mode.
    pub attempts: u32,
    pub backoff_step_secs: u64,
    pub backoff_cap_secs: u64,
    /// Per-call timeout while waiting for the fleet to come up.
    pub timeout_secs: u64,
    /// Per-call timeout for point-in-time diagnostics.
    pub one_shot_timeout_secs: u64,
    pub parallel: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 15,
            backoff_step_secs: 2,
            backoff_cap_secs: 10,
            timeout_secs: 10,
            one_shot_timeout_secs: 3,
            parallel: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProbeConfig {
    pub front_door: String,
    pub instance_field: String,
    pub trials: u32,
    pub trial_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            front_door: "http://localhost/health".to_string(),
            instance_field: "instance_id".to_string(),
            trials: 5,
            trial_delay_ms: 500,
            timeout_secs: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeployConfig {
    pub compose_command: Vec<String>,
    pub compose_file: PathBuf,
    pub required_artifacts: Vec<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            compose_command: vec!["docker".to_string(), "compose".to_string()],
            compose_file: PathBuf::from("docker-compose.yml"),
            required_artifacts: Vec::new(),
        }
    }
}

fn default_critical() -> bool {
    true
}

fn target(name: &str, url: &str) -> TargetConfig {
    TargetConfig {
        name: name.to_string(),
        url: url.to_string(),
        critical: true,
    }
}

/// The airline fleet as laid out by the stock compose file: the proxy, the
/// gateway, and every service replica.
pub fn default_targets() -> Vec<TargetConfig> {
    vec![
        target("load-balancer", "http://localhost/health"),
        target("api-gateway", "http://localhost:8000/health"),
        target("flight-service-1", "http://localhost:8001/health"),
        target("flight-service-2", "http://localhost:8011/health"),
        target("passenger-service-1", "http://localhost:8002/health"),
        target("passenger-service-2", "http://localhost:8012/health"),
        target("reservation-service-1", "http://localhost:8003/health"),
        target("reservation-service-2", "http://localhost:8013/health"),
        target("user-service", "http://localhost:8004/health"),
        target("aircraft-service", "http://localhost:8005/health"),
        target("airport-service", "http://localhost:8006/health"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fleet_has_eleven_critical_targets() {
        let targets = default_targets();
        assert_eq!(targets.len(), 11);
        assert!(targets.iter().all(|target| target.critical));
    }

    #[test]
    fn partial_toml_keeps_section_defaults() {
        let config: VerifierConfig = toml::from_str(
            r#"
[probe]
trials = 9
"#,
        )
        .unwrap();
        assert_eq!(config.probe.trials, 9);
        assert_eq!(config.probe.trial_delay_ms, 500);
        assert_eq!(config.probe.instance_field, "instance_id");
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.targets.len(), 11);
    }

    #[test]
    fn target_critical_defaults_to_true() {
        let target: TargetConfig =
            serde_json::from_str(r#"{"name":"api","url":"http://api/health"}"#).unwrap();
        assert!(target.critical);
    }
}
