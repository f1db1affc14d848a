use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::{EndpointTarget, HealthDetails, HealthOutcome, HealthResult, ServiceStatus};

/// Result of one GET, with every failure already folded into a value.
#[derive(Debug)]
pub enum Fetched {
    Success {
        status: u16,
        body: Option<Value>,
        latency: Duration,
    },
    Failure {
        kind: FailureKind,
        message: String,
        latency: Duration,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Timeout,
    Status(u16),
}

#[derive(Clone)]
pub struct HttpChecker {
    client: Client,
    instance_field: String,
}

impl HttpChecker {
    pub fn new(instance_field: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|err| Error::HttpClient(err.to_string()))?;
        Ok(Self {
            client,
            instance_field: instance_field.into(),
        })
    }

    pub fn instance_field(&self) -> &str {
        &self.instance_field
    }

    pub async fn fetch(&self, url: &str, timeout: Duration) -> Fetched {
        let start = Instant::now();
        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                return Fetched::Failure {
                    kind: classify_error(&err),
                    message: err.to_string(),
                    latency: start.elapsed(),
                }
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Fetched::Failure {
                kind: FailureKind::Status(status.as_u16()),
                message: format!("HTTP {}", status),
                latency: start.elapsed(),
            };
        }

        // A 2xx is healthy whatever the body looks like.
        let body = match response.bytes().await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    debug!(url, error = %err, "health body is not json");
                    None
                }
            },
            Err(err) => {
                debug!(url, error = %err, "failed to read health body");
                None
            }
        };

        Fetched::Success {
            status: status.as_u16(),
            body,
            latency: start.elapsed(),
        }
    }

    pub async fn check(&self, target: &EndpointTarget, timeout: Duration) -> HealthResult {
        match self.fetch(&target.url, timeout).await {
            Fetched::Success {
                status,
                body,
                latency,
            } => HealthResult {
                target: target.clone(),
                outcome: HealthOutcome::Healthy,
                latency,
                http_status: Some(status),
                error: None,
                details: body
                    .as_ref()
                    .map(|value| decode_details(value, &self.instance_field)),
            },
            Fetched::Failure {
                kind,
                message,
                latency,
            } => {
                debug!(
                    endpoint = %target.name,
                    url = %target.url,
                    critical = target.critical,
                    error = %message,
                    "health check failed"
                );
                let (outcome, http_status) = match kind {
                    FailureKind::Timeout => (HealthOutcome::Timeout, None),
                    FailureKind::Transport => (HealthOutcome::Unhealthy, None),
                    FailureKind::Status(code) => (HealthOutcome::Unhealthy, Some(code)),
                };
                HealthResult {
                    target: target.clone(),
                    outcome,
                    latency,
                    http_status,
                    error: Some(message),
                    details: None,
                }
            }
        }
    }
}

fn classify_error(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Transport
    }
}

/// Reads `field` from a JSON object as a string. Numbers are stringified.
pub fn instance_identity(body: &Value, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::String(value) if !value.is_empty() => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

pub fn decode_details(body: &Value, instance_field: &str) -> HealthDetails {
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string);

    let services = match body.get("services") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(ServiceStatus::new(name.as_str(), None)),
                Value::Object(map) => map
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|name| ServiceStatus::new(name, status_of(item))),
                _ => None,
            })
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, service)| ServiceStatus::new(name.as_str(), status_of(service)))
            .collect(),
        _ => Vec::new(),
    };

    let database = body
        .get("database")
        .and_then(status_of)
        .map(str::to_string);

    let circuit_breakers = match body.get("circuit_breakers") {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, breaker)| {
                let state = breaker
                    .get("state")
                    .and_then(Value::as_str)
                    .or_else(|| breaker.as_str())
                    .unwrap_or("unknown");
                (name.clone(), state.to_string())
            })
            .collect(),
        _ => Default::default(),
    };

    HealthDetails {
        status,
        instance_id: instance_identity(body, instance_field),
        services,
        database,
        circuit_breakers,
    }
}

/// A bare string, or an object carrying a string `status`.
fn status_of(value: &Value) -> Option<&str> {
    match value {
        Value::String(status) => Some(status.as_str()),
        Value::Object(map) => map.get("status").and_then(Value::as_str),
        _ => None,
    }
}
