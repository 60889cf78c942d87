use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;

use dmaker_core::{Clock, DeveloperService, ErrorCode};
use dmaker_storage::Database;

use crate::{developer, error::ApiError, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    developers: DeveloperService,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: &Database, clock: Clock) -> Self {
        let developers = DeveloperService::new(
            Arc::new(storage.developers()),
            Arc::new(storage.retired_developers()),
            clock,
        );
        Self {
            metrics,
            developers,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn developers(&self) -> &DeveloperService {
        &self.developers
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/developers", get(developer::list))
        .route("/create-developer", post(developer::create))
        .route(
            "/developer/:member_id",
            get(developer::detail)
                .put(developer::edit)
                .delete(developer::retire),
        )
        .route("/retired-developers", get(developer::retired))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(unknown_route)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> Response {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        Body::from(body),
    )
        .into_response()
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        ErrorCode::InvalidRequest,
        "method is not supported for this resource",
    )
}

async fn unknown_route() -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        ErrorCode::NotFound,
        "no resource matches the request path",
    )
}
