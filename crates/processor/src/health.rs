use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use prometheus_client::{encoding::text::encode, registry::Registry};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;

use crate::{
    circuit_breaker::{CircuitBreakerSnapshot, CircuitState},
    poller::PollerStatus,
};

#[derive(Clone)]
pub struct HealthState {
    pub status: Arc<PollerStatus>,
    pub registry: Arc<Registry>,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub circuit_breaker: CircuitBreakerSnapshot,
    pub last_successful_poll: Option<DateTime<Utc>>,
    pub processed: u64,
    pub failed: u64,
    pub uptime_seconds: u64,
}

pub async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let circuit_breaker = state.status.breaker_snapshot().await;

    let status = match circuit_breaker.state {
        CircuitState::Closed => "ok",
        CircuitState::Open | CircuitState::HalfOpen => "degraded",
    };

    let report = HealthReport {
        status,
        circuit_breaker,
        last_successful_poll: state.status.last_successful_poll().await,
        processed: state.status.processed(),
        failed: state.status.failed(),
        uptime_seconds: state.status.uptime().as_secs(),
    };

    (StatusCode::OK, Json(report))
}

pub async fn metrics_handler(State(state): State<HealthState>) -> Response {
    let mut buffer = String::new();

    if let Err(e) = encode(&mut buffer, &state.registry) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {e}"),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [(
            CONTENT_TYPE,
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        Body::from(buffer),
    )
        .into_response()
}

pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    state: HealthState,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("🩺 Health server listening on http://{addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Health server received shutdown signal");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::{CircuitBreakerConfig, FailureKind};
    use axum::{body::to_bytes, http::Request};
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> HealthState {
        HealthState {
            status: Arc::new(PollerStatus::new(CircuitBreakerConfig {
                threshold: 3,
                cooldown: Duration::from_secs(60),
            })),
            registry: Arc::new(Registry::default()),
        }
    }

    #[tokio::test]
    async fn health_reports_ok_when_breaker_closed() {
        let response = router(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "ok");
        assert_eq!(json["circuit_breaker"]["state"], "closed");
        assert_eq!(json["processed"], 0);
        assert!(json["last_successful_poll"].is_null());
    }

    #[tokio::test]
    async fn health_is_degraded_but_still_200_when_breaker_open() {
        let state = state();
        {
            let mut breaker = state.status.breaker.lock().await;
            for _ in 0..3 {
                breaker.record_failure(FailureKind::Processing);
            }
        }

        let response = router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["status"], "degraded");
        assert_eq!(json["circuit_breaker"]["state"], "open");
        assert_eq!(json["circuit_breaker"]["trips"], 1);
    }

    #[tokio::test]
    async fn metrics_are_openmetrics_text() {
        let response = router(state())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("application/openmetrics-text")
        );
    }
}
