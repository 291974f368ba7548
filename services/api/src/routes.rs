use crate::infra::AppState;
use crate::ws::ws_handler;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use lifeline::dispatch::{
    dispatch_router, DispatchService, EventBroadcaster, IncidentRepository, Notifier,
    UserDirectory,
};

/// Mount the dispatch API plus the operational endpoints and the real-time
/// channel.
pub(crate) fn with_dispatch_routes<R, D, N>(
    service: Arc<DispatchService<R, D, N>>,
    broadcaster: EventBroadcaster,
) -> axum::Router
where
    R: IncidentRepository + 'static,
    D: UserDirectory + 'static,
    N: Notifier + 'static,
{
    dispatch_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route("/ws", axum::routing::get(ws_handler))
        .layer(Extension(broadcaster))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
