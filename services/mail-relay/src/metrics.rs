//! Prometheus metrics exposition
//!
//! - `relay_token_exchanges_total` (counter): labels `flow`, `outcome`
//! - `relay_graph_requests_total` (counter): label `outcome`
//! - `relay_graph_request_duration_seconds` (histogram)

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

const GRAPH_DURATION: &str = "relay_graph_request_duration_seconds";

const GRAPH_BUCKETS: &[f64] = &[0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Which grant a token exchange used.
#[derive(Debug, Clone, Copy)]
pub enum Flow {
    AuthorizationCode,
    ClientCredentials,
}

impl Flow {
    fn as_str(self) -> &'static str {
        match self {
            Flow::AuthorizationCode => "authorization_code",
            Flow::ClientCredentials => "client_credentials",
        }
    }
}

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(GRAPH_DURATION.to_string()), GRAPH_BUCKETS)
}

/// Install the global Prometheus recorder and return the render handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

/// Record the result of one token exchange.
pub fn record_token_exchange(flow: Flow, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("relay_token_exchanges_total", "flow" => flow.as_str(), "outcome" => outcome)
        .increment(1);
}

/// Record one Graph call with its outcome label and latency.
pub fn record_graph_request(outcome: &'static str, duration_secs: f64) {
    metrics::counter!("relay_graph_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!(GRAPH_DURATION).record(duration_secs);
}
