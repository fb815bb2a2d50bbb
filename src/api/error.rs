use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::service::{ErrorKind, ServiceError};
use crate::Located;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub error: ErrorKind,
}

pub fn status_of(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        match kind {
            ErrorKind::Internal => {
                tracing::error!(error = %self, location = %self.location(), "request failed")
            }
            _ => tracing::debug!(error = %self, location = %self.location(), "request rejected"),
        }

        let body = ErrorBody {
            message: self.to_string(),
            error: kind,
        };

        (status_of(kind), Json(body)).into_response()
    }
}
