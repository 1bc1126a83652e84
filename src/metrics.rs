//! Prometheus metrics for the demo service.
//!
//! Exposes an HTTP endpoint for Prometheus scraping.

use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::{error, info};

/// Initialize the metrics system and return the Prometheus handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    describe_histogram!(
        "demo_search_latency_ms",
        "Time taken for upstream vertical searches in milliseconds"
    );
    describe_counter!("demo_search_total", "Total number of demo searches processed");
    describe_counter!(
        "demo_upstream_errors_total",
        "Total number of failed upstream calls"
    );

    PrometheusBuilder::new().install_recorder()
}

/// Record a search latency measurement.
pub fn record_search_latency(latency_ms: f64) {
    histogram!("demo_search_latency_ms").record(latency_ms);
}

/// Increment the search count for a demo.
pub fn increment_search_count(demo: &str) {
    counter!("demo_search_total", "demo" => demo.to_string()).increment(1);
}

/// Increment the upstream error count.
pub fn increment_upstream_errors(service: &'static str) {
    counter!("demo_upstream_errors_total", "service" => service).increment(1);
}

/// Create an Axum router for the metrics HTTP endpoint.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
}

/// Start the metrics HTTP server on the given port with auto-detect binding.
pub async fn start_metrics_server(port: u16, handle: PrometheusHandle) {
    let app = metrics_router(handle);

    let listener = match tokio::net::TcpListener::bind(("::", port)).await {
        Ok(listener) => {
            info!(port = port, bind = "::", "Starting metrics server (dual-stack)");
            listener
        }
        Err(_) => match tokio::net::TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => {
                info!(
                    port = port,
                    bind = "0.0.0.0",
                    "Starting metrics server (IPv4-only fallback)"
                );
                listener
            }
            Err(e) => {
                error!(error = %e, port, "Failed to bind metrics server");
                return;
            }
        },
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Metrics server failed");
    }
}
