use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use church_finder::workflows::churches::{
    church_router, ChurchEvaluationService, ChurchLocator, ChurchStore, CrawlProvider,
    DoctrinalExtractor, Geocoder,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_church_routes<C, X, G, S>(
    service: Arc<ChurchEvaluationService<C, X, G, S>>,
    admin_id: Option<String>,
) -> axum::Router
where
    C: CrawlProvider + 'static,
    X: DoctrinalExtractor + 'static,
    G: Geocoder + ChurchLocator + 'static,
    S: ChurchStore + 'static,
{
    church_router(service, admin_id)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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
