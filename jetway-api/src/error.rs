use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jetway_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Core(err) => match err {
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::SeatConflict { .. } => StatusCode::CONFLICT,
                CoreError::ValidationError(_) => StatusCode::BAD_REQUEST,
                CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                CoreError::TooEarly { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CoreError::AlreadyRated(_) | CoreError::AlreadyExists(_) => StatusCode::CONFLICT,
                CoreError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                CoreError::InvalidTransition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Core(CoreError::InvalidTransition { .. }) => {
                tracing::error!("Internal Server Error: {}", self);
                json!({ "error": "Internal Server Error" })
            }
            AppError::Core(CoreError::StorageUnavailable(msg)) => {
                tracing::error!("Storage unavailable: {}", msg);
                json!({ "error": "Storage unavailable, try again later" })
            }
            AppError::Core(CoreError::SeatConflict { leg, seat, segment }) => {
                let segment = segment.as_ref().map(|s| s.to_string());
                json!({
                    "error": self.to_string(),
                    "seat": seat.to_string(),
                    "flight": leg.to_string(),
                    "segment": segment,
                })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
