//! API Server (Cold Path)
//!
//! Read-only REST API over engine snapshots. Handlers take the engine read
//! lock just long enough to copy out a snapshot.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::engine::{EngineSnapshot, SharedEngine};
use crate::hot_path::CompositePrice;
use crate::infrastructure::config::ApiConfig;
use crate::infrastructure::metrics::{MetricsCollector, MetricsSnapshot};
use crate::CompositeError;

/// Health information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub is_connected: bool,
    pub latency_ms: u64,
    pub tracking_pairs: usize,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeDto {
    pub base: String,
    pub settlement: String,
    #[serde(flatten)]
    pub composite: CompositePrice,
}

#[derive(Debug, Serialize)]
pub struct ErrorDto {
    pub error: String,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub metrics: Arc<MetricsCollector>,
}

/// API routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/composite", get(get_composite))
        .route("/api/pairs", get(get_pairs))
        .route("/api/health", get(get_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
pub async fn start_server(state: AppState, config: &ApiConfig) -> Result<(), CompositeError> {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(target: "api", "API Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Handler for /api/composite
/// 503 until at least one weighted pair is tracking
async fn get_composite(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read();
    let base = engine.registry().base().to_string();
    let settlement = engine.registry().settlement().to_string();
    let composite = engine.composite();
    drop(engine);

    match composite {
        Ok(composite) => (
            StatusCode::OK,
            Json(CompositeDto {
                base,
                settlement,
                composite,
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorDto { error: e.to_string() }),
        )
            .into_response(),
    }
}

/// Handler for /api/pairs
async fn get_pairs(State(state): State<AppState>) -> Json<EngineSnapshot> {
    let snapshot = state.engine.read().snapshot();
    Json(snapshot)
}

/// Handler for /api/health
async fn get_health(State(state): State<AppState>) -> Json<HealthDto> {
    let tracking_pairs = state
        .engine
        .read()
        .snapshot()
        .pairs
        .iter()
        .filter(|p| p.tracking)
        .count();

    Json(HealthDto {
        is_connected: state.metrics.is_connected(),
        latency_ms: state.metrics.latency_ms(),
        tracking_pairs,
        metrics: state.metrics.snapshot(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PriceEngine;
    use crate::exchanges::FeedMessage;
    use crate::hot_path::VolumeWeights;
    use crate::test_utils::{sol_registry, trade_tick};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use parking_lot::RwLock;
    use std::time::Duration;
    use tower::ServiceExt;

    fn state() -> AppState {
        let metrics = Arc::new(MetricsCollector::new());
        let mut weights = VolumeWeights::new();
        weights.insert("SOLUSDT", 10.0).unwrap();
        let engine = PriceEngine::new(
            Arc::new(sol_registry()),
            weights,
            Duration::from_secs(10),
            metrics.clone(),
        );
        AppState {
            engine: Arc::new(RwLock::new(engine)),
            metrics,
        }
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_composite_no_data() {
        let (status, body) = get_json(state(), "/api/composite").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().starts_with("No data"));
    }

    #[tokio::test]
    async fn test_composite_value() {
        let state = state();
        state
            .engine
            .write()
            .apply(FeedMessage::Trade(trade_tick("SOLUSDT", 123.5, 1)));

        let (status, body) = get_json(state, "/api/composite").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["base"], "SOL");
        assert_eq!(body["value"], 123.5);
        assert_eq!(body["pair_count"], 1);
    }

    #[tokio::test]
    async fn test_pairs_and_health() {
        let state = state();
        state
            .engine
            .write()
            .apply(FeedMessage::Trade(trade_tick("SOLUSDT", 100.0, 1)));

        let (status, body) = get_json(state.clone(), "/api/pairs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pairs"].as_array().unwrap().len(), 3);

        let (status, body) = get_json(state, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["trackingPairs"], 1);
        assert_eq!(body["metrics"]["ema_updates"], 1);
    }
}
