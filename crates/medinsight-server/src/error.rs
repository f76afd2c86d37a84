use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use medinsight_ml::ModelError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failure of an API request, rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", .0.body_text())]
    Rejected(#[from] JsonRejection),

    #[error("{0}")]
    Model(#[from] ModelError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Rejected(rejection) => rejection.status(),
            Self::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();
        match &self {
            Self::Rejected(_) => warn!(%status, %detail, "rejected request body"),
            Self::Model(_) => error!(%detail, "prediction failed"),
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
