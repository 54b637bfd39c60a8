use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Geocoding transport or parse failure.
    #[error("Location lookup failed: {0}")]
    LookupFailed(String),

    /// Weather service transport or parse failure.
    #[error("Wind data fetch failed: {0}")]
    FetchFailed(String),

    /// Both the history and the forecast series came back empty.
    #[error("No wind data available for this location and period")]
    NoDataAvailable,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::LookupFailed(_) | AppError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::NoDataAvailable => StatusCode::NOT_FOUND,
            AppError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            axum::Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::InternalError(format!("CSV export error: {}", err))
    }
}
