//! Dashboard HTTP API
//!
//! Read-only snapshot/history/health endpoints plus the control endpoints
//! that forward user actions into the orchestrator. Nothing here mutates
//! engine state directly.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use crate::engine::{Command, Engine, OrchestratorHandle};
use crate::types::DisplayUnit;

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<Engine>,
    pub handle: OrchestratorHandle,
}

/// Create the API router with all endpoints
pub fn create_router(engine: Arc<Engine>, handle: OrchestratorHandle) -> Router {
    Router::new()
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/history", get(get_history))
        .route("/api/health", get(get_health))
        .route("/api/controls/pause", post(post_pause))
        .route("/api/controls/resume", post(post_resume))
        .route("/api/controls/refresh", post(post_refresh))
        .route("/api/controls/settings", post(post_settings))
        .with_state(ApiState { engine, handle })
        // CORS for the static frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// GET /api/snapshot - Complete render-facing engine state
async fn get_snapshot(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.engine.snapshot(now_ms()).await;
    Json(ApiResponse::success(snapshot))
}

/// GET /api/history - Pruned chart series projected by the active unit
async fn get_history(State(state): State<ApiState>) -> impl IntoResponse {
    let history = state.engine.history(now_ms()).await;
    Json(ApiResponse::success(history))
}

/// GET /api/health - Per-feed freshness/latency/error diagnostics
async fn get_health(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.engine.snapshot(now_ms()).await;
    let feeds = snapshot
        .feeds
        .iter()
        .map(|f| FeedHealthResponse {
            feed: f.label.to_string(),
            status: f.status,
            age_ms: f.age_ms,
            latency_ms: f.latency_ms,
            error: f.error.clone(),
        })
        .collect();
    Json(ApiResponse::success(HealthResponse {
        aggregate_status: snapshot.aggregate_status,
        stale_threshold_ms: snapshot.stale_ms,
        feeds,
    }))
}

/// POST /api/controls/pause
async fn post_pause(State(state): State<ApiState>) -> impl IntoResponse {
    state.handle.send(Command::Pause).await;
    Json(ApiResponse::success("paused"))
}

/// POST /api/controls/resume - also triggers an immediate tick
async fn post_resume(State(state): State<ApiState>) -> impl IntoResponse {
    state.handle.send(Command::Resume).await;
    Json(ApiResponse::success("resumed"))
}

/// POST /api/controls/refresh - manual tick
async fn post_refresh(State(state): State<ApiState>) -> impl IntoResponse {
    state.handle.send(Command::Refresh).await;
    Json(ApiResponse::success("refreshing"))
}

/// POST /api/controls/settings - cadence / window / display unit
async fn post_settings(
    State(state): State<ApiState>,
    Json(request): Json<SettingsRequest>,
) -> impl IntoResponse {
    if let Some(refresh_ms) = request.refresh_ms {
        if !(500..=600_000).contains(&refresh_ms) {
            return Json(ApiResponse::<&str>::error(
                "refresh_ms must be between 500 and 600000",
            ));
        }
        state.handle.send(Command::SetRefreshMs(refresh_ms)).await;
    }

    if let Some(window_ms) = request.window_ms {
        if !(60_000..=86_400_000).contains(&window_ms) {
            return Json(ApiResponse::<&str>::error(
                "window_ms must be between 60000 and 86400000",
            ));
        }
        state.handle.send(Command::SetWindowMs(window_ms)).await;
    }

    if let Some(unit) = request.unit.as_deref() {
        match unit.parse::<DisplayUnit>() {
            Ok(unit) => state.handle.send(Command::SetUnit(unit)).await,
            Err(_) => return Json(ApiResponse::<&str>::error("unit must be 'usd' or 'bps'")),
        }
    }

    Json(ApiResponse::success("ok"))
}
