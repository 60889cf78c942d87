use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use dmaker_core::{DeveloperError, ErrorCode};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error_code: ErrorCode,
    error_message: String,
}

/// Error returned by every developer endpoint, rendered as `{errorCode, errorMessage}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, code: ErrorCode, message: S) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn invalid_request<S: Into<String>>(detail: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::InvalidRequest, detail)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

impl From<DeveloperError> for ApiError {
    fn from(err: DeveloperError) -> Self {
        let code = err.code();
        match &err {
            DeveloperError::Rule(_) => Self::new(StatusCode::CONFLICT, code, err.to_string()),
            DeveloperError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, code, err.to_string()),
            DeveloperError::Store(source) => {
                error!(stage = "http", error = %source, "store failure surfaced to caller");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, code.message())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(stage = "http", reason = %rejection.body_text(), "rejected request body");
        Self::invalid_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(stage = "http", reason = %rejection.body_text(), "rejected query string");
        Self::invalid_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error_code: self.code,
            error_message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
