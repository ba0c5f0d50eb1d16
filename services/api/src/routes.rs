use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use retreat_registry::registrations::{registration_router, RegistrationService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes(service: Arc<RegistrationService>) -> axum::Router {
    let catalog = axum::Router::new()
        .route("/api/v1/catalog", axum::routing::get(catalog_endpoint))
        .with_state(service.clone());

    registration_router(service)
        .merge(catalog)
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

/// Events, pools, and views currently loaded, so dashboards can build their
/// menus.
pub(crate) async fn catalog_endpoint(
    State(service): State<Arc<RegistrationService>>,
) -> Json<serde_json::Value> {
    let events: Vec<serde_json::Value> = service
        .events()
        .map(|event| {
            json!({
                "aid": event.aid,
                "name": event.name,
                "pool": event.config.pool,
                "subEvents": event.sub_events.keys().collect::<Vec<_>>(),
                "dashboardViews": event.config.dashboard_views,
            })
        })
        .collect();
    let pools: Vec<&str> = service.pools().names().collect();
    let views: Vec<&str> = service.views().names().collect();

    Json(json!({
        "events": events,
        "pools": pools,
        "views": views,
        "participants": service.participants().len(),
    }))
}
