use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use crate::models::TargetConfig;

/// Sentinel recorded for a probe trial that got no usable answer.
pub const FAILED_INSTANCE: &str = "FAILED";
/// Recorded when a trial succeeded but the body carried no instance identity.
pub const UNKNOWN_INSTANCE: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndpointTarget {
    pub name: String,
    pub url: String,
    pub critical: bool,
}

impl From<&TargetConfig> for EndpointTarget {
    fn from(value: &TargetConfig) -> Self {
        Self {
            name: value.name.clone(),
            url: value.url.clone(),
            critical: value.critical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthOutcome {
    Healthy,
    Unhealthy,
    Timeout,
}

impl fmt::Display for HealthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthOutcome::Healthy => write!(f, "healthy"),
            HealthOutcome::Unhealthy => write!(f, "unhealthy"),
            HealthOutcome::Timeout => write!(f, "timeout"),
        }
    }
}

/// Fields pulled out of a health body. Anything missing stays `None` or empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HealthDetails {
    pub status: Option<String>,
    pub instance_id: Option<String>,
    pub services: Vec<ServiceStatus>,
    pub database: Option<String>,
    pub circuit_breakers: BTreeMap<String, String>,
}

/// A downstream service named in a health body, with its reported status if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    pub status: Option<String>,
}

impl ServiceStatus {
    pub fn new(name: impl Into<String>, status: Option<&str>) -> Self {
        Self {
            name: name.into(),
            status: status.map(str::to_string),
        }
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            Some(status) => write!(f, "{}={}", self.name, status),
            None => write!(f, "{}", self.name),
        }
    }
}

impl HealthDetails {
    pub fn is_degraded(&self) -> bool {
        matches!(
            self.status.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("degraded") | Some("unhealthy")
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthResult {
    pub target: EndpointTarget,
    pub outcome: HealthOutcome,
    #[serde(rename = "latency_ms", serialize_with = "serialize_millis")]
    pub latency: Duration,
    pub http_status: Option<u16>,
    pub error: Option<String>,
    pub details: Option<HealthDetails>,
}

impl HealthResult {
    pub fn is_healthy(&self) -> bool {
        self.outcome == HealthOutcome::Healthy
    }

    pub fn is_degraded(&self) -> bool {
        self.details
            .as_ref()
            .map(HealthDetails::is_degraded)
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProbeSample {
    pub trial_index: u32,
    pub instance_id: String,
}

impl ProbeSample {
    pub fn failed(trial_index: u32) -> Self {
        Self {
            trial_index,
            instance_id: FAILED_INSTANCE.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.instance_id == FAILED_INSTANCE
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DistributionOutcome {
    pub distinct_instances: BTreeSet<String>,
    pub failed_count: u32,
}

impl DistributionOutcome {
    pub fn from_samples(samples: &[ProbeSample]) -> Self {
        let mut outcome = Self::default();
        for sample in samples {
            if sample.is_failed() {
                outcome.failed_count += 1;
            } else {
                outcome.distinct_instances.insert(sample.instance_id.clone());
            }
        }
        outcome
    }
}

fn serialize_millis<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(ids: &[&str]) -> Vec<ProbeSample> {
        ids.iter()
            .enumerate()
            .map(|(idx, id)| ProbeSample {
                trial_index: idx as u32 + 1,
                instance_id: id.to_string(),
            })
            .collect()
    }

    #[test]
    fn distribution_excludes_failed_sentinel() {
        let outcome = DistributionOutcome::from_samples(&samples(&["a", "FAILED", "b", "a"]));
        assert_eq!(outcome.distinct_instances.len(), 2);
        assert!(!outcome.distinct_instances.contains(FAILED_INSTANCE));
        assert_eq!(outcome.failed_count, 1);
    }

    #[test]
    fn distribution_counts_unknown_as_an_instance() {
        let outcome = DistributionOutcome::from_samples(&samples(&["unknown", "unknown"]));
        assert_eq!(outcome.distinct_instances.len(), 1);
        assert_eq!(outcome.failed_count, 0);
    }

    #[test]
    fn degraded_status_is_case_insensitive() {
        let details = HealthDetails {
            status: Some("Degraded".to_string()),
            ..HealthDetails::default()
        };
        assert!(details.is_degraded());
        assert!(!HealthDetails::default().is_degraded());
    }
}
