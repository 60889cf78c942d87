//! HTTP handlers for the developer endpoints.

use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use metrics::{counter, histogram};
use serde::Deserialize;

use dmaker_core::types::{
    CreateDeveloperRequest, DeveloperDetail, DeveloperSummary, EditDeveloperRequest,
    RetiredDeveloperView,
};

use crate::error::ApiError;
use crate::request::{prepare_create, validate_edit};
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct RetiredQuery {
    #[serde(rename = "memberId")]
    member_id: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<Vec<DeveloperSummary>>, ApiError> {
    let started = Instant::now();
    let result = state
        .developers()
        .list_employed()
        .await
        .map_err(ApiError::from);
    observe("list", started, &result);
    Ok(Json(result?))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<Json<DeveloperDetail>, ApiError> {
    let started = Instant::now();
    let result = state
        .developers()
        .detail(&member_id)
        .await
        .map_err(ApiError::from);
    observe("detail", started, &result);
    Ok(Json(result?))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateDeveloperRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DeveloperDetail>), ApiError> {
    let started = Instant::now();
    let result = match payload {
        Ok(Json(request)) => match prepare_create(request) {
            Ok(request) => state
                .developers()
                .create(&request)
                .await
                .map_err(ApiError::from),
            Err(err) => Err(err),
        },
        Err(rejection) => Err(ApiError::from(rejection)),
    };
    observe("create", started, &result);
    Ok((StatusCode::CREATED, Json(result?)))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    payload: Result<Json<EditDeveloperRequest>, JsonRejection>,
) -> Result<Json<DeveloperDetail>, ApiError> {
    let started = Instant::now();
    let result = match payload {
        Ok(Json(request)) => match validate_edit(&request) {
            Ok(()) => state
                .developers()
                .edit(&member_id, &request)
                .await
                .map_err(ApiError::from),
            Err(err) => Err(err),
        },
        Err(rejection) => Err(ApiError::from(rejection)),
    };
    observe("edit", started, &result);
    Ok(Json(result?))
}

pub async fn retire(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> Result<Json<DeveloperDetail>, ApiError> {
    let started = Instant::now();
    let result = state
        .developers()
        .retire(&member_id)
        .await
        .map_err(ApiError::from);
    observe("retire", started, &result);
    Ok(Json(result?))
}

pub async fn retired(
    State(state): State<AppState>,
    query: Result<Query<RetiredQuery>, QueryRejection>,
) -> Result<Json<Vec<RetiredDeveloperView>>, ApiError> {
    let started = Instant::now();
    let result = match query {
        Ok(Query(query)) => state
            .developers()
            .retired(query.member_id.as_deref())
            .await
            .map_err(ApiError::from),
        Err(rejection) => Err(ApiError::from(rejection)),
    };
    observe("retired", started, &result);
    Ok(Json(result?))
}

fn observe<T>(operation: &'static str, started: Instant, result: &Result<T, ApiError>) {
    let outcome = match result {
        Ok(_) => "OK",
        Err(err) => err.code().as_str(),
    };
    counter!("developer_requests_total", "operation" => operation, "result" => outcome)
        .increment(1);
    histogram!("developer_request_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}
