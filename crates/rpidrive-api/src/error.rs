//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use rpidrive_core::error::{AppError, ErrorKind};

/// Message sent in place of any server-side failure.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

/// Error returned by every handler and extractor.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// HTTP status for an error kind.
    pub fn status_for(kind: ErrorKind) -> StatusCode {
        match kind {
            ErrorKind::Validation | ErrorKind::InvalidOperation | ErrorKind::Conflict => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization | ErrorKind::Blocked => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Cache
            | ErrorKind::Storage
            | ErrorKind::Configuration
            | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn status(&self) -> StatusCode {
        Self::status_for(self.0.kind)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(kind = %self.0.kind, error = %self.0.chain(), "Internal server error");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.0.message
        };

        (status, Json(ApiErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::status_for(ErrorKind::Conflict), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::status_for(ErrorKind::InvalidOperation),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::status_for(ErrorKind::Authentication),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::status_for(ErrorKind::Blocked), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::status_for(ErrorKind::Authorization), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::status_for(ErrorKind::Database),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_client_error_keeps_message() {
        let response = ApiError::from(AppError::not_found("File not found")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await["error"], "File not found");
    }

    #[tokio::test]
    async fn test_server_error_hides_detail() {
        let response =
            ApiError::from(AppError::database("relation \"files\" does not exist")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await["error"], INTERNAL_MESSAGE);
    }
}
