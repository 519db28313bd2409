use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cinescope_core::{CatalogError, ProviderError};
use serde_json::json;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.message,
        }));

        (self.status, body).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(msg) => Self::bad_request(msg),
            CatalogError::NotFound(what) => Self::not_found(format!("{what} not found")),
            CatalogError::Upstream(ProviderError::RateLimited) => {
                Self::rate_limited("Upstream rate limit exceeded, retry later")
            }
            CatalogError::Upstream(provider) => {
                tracing::warn!(error = %provider, "upstream request failed");
                Self::bad_gateway(provider.to_string())
            }
            CatalogError::Storage(detail) => {
                tracing::error!(error = %detail, "detail cache storage failed");
                Self::internal("Internal server error")
            }
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_errors_map_to_statuses() {
        let cases = [
            (CatalogError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (CatalogError::NotFound("movie 1".into()), StatusCode::NOT_FOUND),
            (
                CatalogError::Upstream(ProviderError::RateLimited),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                CatalogError::Upstream(ProviderError::ApiError("boom".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                CatalogError::Upstream(ProviderError::InvalidApiKey),
                StatusCode::BAD_GATEWAY,
            ),
            (
                CatalogError::Storage("pool closed".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status, expected);
        }
    }

    #[test]
    fn storage_details_are_not_exposed() {
        let err = AppError::from(CatalogError::Storage("password=hunter2".into()));
        assert!(!err.message.contains("hunter2"));
    }
}
