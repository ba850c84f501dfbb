//! Mapping of analysis failures to HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chess_tutor_core::{AnalysisError, ErrorClass};
use serde_json::json;
use tracing::warn;

#[derive(Debug)]
pub struct ApiError(pub AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(error: AnalysisError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.class() {
            ErrorClass::Client => StatusCode::BAD_REQUEST,
            ErrorClass::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status != StatusCode::BAD_REQUEST {
            warn!(error = %self.0, "analysis request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
