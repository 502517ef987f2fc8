use crate::db::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use snafu::Snafu;

/// Errors that reach the HTTP boundary. Serialized as the
/// `{"status":"error","message":...}` envelope every endpoint uses.
#[derive(Debug, Snafu)]
pub enum ApiError {
    #[snafu(display("{entity} not found"))]
    NotFound { entity: &'static str },

    #[snafu(display("{message}"))]
    Validation { message: String },

    #[snafu(display("{message}"))]
    Conflict { message: String },

    #[snafu(display("Database query failed: {source}"))]
    Database { source: DbError },

    #[snafu(display("{message}"))]
    Internal { message: String },
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound { entity: "record" },
            DbError::InvalidState { source } => ApiError::Conflict {
                message: source.to_string(),
            },
            _ => ApiError::Database { source: err },
        }
    }
}

impl From<crate::services::ServiceError> for ApiError {
    fn from(err: crate::services::ServiceError) -> Self {
        use crate::services::ServiceError;
        match err {
            ServiceError::Database { source } => source.into(),
            ServiceError::Precondition { message } => ApiError::Conflict { message },
            ServiceError::Gateway { source } => ApiError::Internal {
                message: source.to_string(),
            },
        }
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Database { .. } | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
