#![allow(dead_code)]

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers the front door as a round-robin balancer over `ids` would.
/// An id of `"FAILED"` answers 502.
pub struct Rotating {
    ids: Vec<String>,
    next: AtomicUsize,
}

impl Rotating {
    pub fn new(ids: &[&str]) -> Self {
        Self {
            ids: ids.iter().map(|id| id.to_string()).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl Respond for Rotating {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let idx = self.next.fetch_add(1, Ordering::SeqCst) % self.ids.len();
        match self.ids[idx].as_str() {
            "FAILED" => ResponseTemplate::new(502),
            id => ResponseTemplate::new(200)
                .set_body_json(json!({"status": "healthy", "instance_id": id})),
        }
    }
}

/// `/ok` answers 200, `/down` answers 503, `/lb` rotates over `instances`.
pub async fn fleet(instances: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lb"))
        .respond_with(Rotating::new(instances))
        .mount(&server)
        .await;
    server
}

pub const SERVICES: [&str; 11] = [
    "load-balancer",
    "api-gateway",
    "flight-service-1",
    "flight-service-2",
    "passenger-service-1",
    "passenger-service-2",
    "reservation-service-1",
    "reservation-service-2",
    "user-service",
    "aircraft-service",
    "airport-service",
];

/// `--target` flags for the eleven-service fleet; names in `down` point at `/down`.
pub fn target_args(server: &MockServer, down: &[&str]) -> Vec<String> {
    SERVICES
        .iter()
        .flat_map(|name| {
            let route = if down.contains(name) { "down" } else { "ok" };
            [
                "--target".to_string(),
                format!("{}={}/{}", name, server.uri(), route),
            ]
        })
        .collect()
}

pub fn front_door_args(server: &MockServer) -> Vec<String> {
    vec![
        "--front-door".to_string(),
        format!("{}/lb", server.uri()),
        "--trial-delay-ms".to_string(),
        "0".to_string(),
        "--no-color".to_string(),
    ]
}
