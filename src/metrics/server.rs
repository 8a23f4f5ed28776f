//! Prometheus endpoint served while a sweep runs.

use crate::metrics::MetricsRegistry;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Errors from the metrics endpoint.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address is unavailable.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Socket error.
        #[source]
        source: std::io::Error,
    },
    /// The accept loop failed.
    #[error("metrics server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

/// Where the endpoint listens.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Socket address to listen on.
    pub bind_addr: SocketAddr,
}

impl MetricsServerConfig {
    /// Listens on every interface at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Serves `/metrics`, `/progress` and `/health` from a shared registry.
///
/// Prometheus metrics are atomic, so the sweep thread updates the registry
/// without coordinating with the server.
pub struct MetricsServer {
    config: MetricsServerConfig,
    registry: Arc<MetricsRegistry>,
}

impl MetricsServer {
    /// Server over a registry shared with the sweep.
    pub fn new(config: MetricsServerConfig, registry: Arc<MetricsRegistry>) -> Self {
        Self { config, registry }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics))
            .route("/progress", get(progress))
            .route("/health", get(|| async { "OK" }))
            .layer(CorsLayer::permissive())
            .with_state(Arc::clone(&self.registry))
    }

    /// Serves until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        tracing::info!(%addr, "Serving sweep metrics");

        axum::serve(listener, self.router())
            .await
            .map_err(ServerError::Serve)
    }
}

async fn metrics(
    State(registry): State<Arc<MetricsRegistry>>,
) -> (StatusCode, [(&'static str, &'static str); 1], String) {
    match registry.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", PROMETHEUS_CONTENT_TYPE)],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("failed to encode metrics: {e}"),
        ),
    }
}

/// `completed/total`, for quick checks from a terminal.
async fn progress(State(registry): State<Arc<MetricsRegistry>>) -> String {
    let (completed, total) = registry.progress();
    format!("{completed}/{total}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsSnapshot;

    fn registry_at(completed: u64, total: u64) -> Arc<MetricsRegistry> {
        let registry = Arc::new(MetricsRegistry::new().unwrap());
        registry.update(&MetricsSnapshot {
            total_steps: total,
            steps_completed: completed,
            patterns_displayed: completed,
            ..Default::default()
        });
        registry
    }

    #[test]
    fn test_config_with_port() {
        let config = MetricsServerConfig::with_port(9464);
        assert_eq!(config.bind_addr.port(), 9464);
        assert!(config.bind_addr.ip().is_unspecified());
    }

    #[tokio::test]
    async fn test_progress_reports_completed_over_total() {
        let body = progress(State(registry_at(12, 64))).await;
        assert_eq!(body, "12/64\n");
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let (status, headers, body) = metrics(State(registry_at(3, 4))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[0].1, PROMETHEUS_CONTENT_TYPE);
        assert!(body.contains("slm_sweep_patterns_displayed_total 3"));
    }
}
