use crate::config::ConfigError;
use crate::marketplace::router::error_response;
use crate::marketplace::MarketplaceError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failures that can end the service process or a request outside the marketplace handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("marketplace error: {0}")]
    Marketplace(#[from] MarketplaceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Marketplace(error) => error_response(error),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marketplace::{JobId, StoreError};

    #[test]
    fn marketplace_errors_keep_their_status() {
        let closed = AppError::from(MarketplaceError::JobClosed(JobId::from("j1")));
        assert_eq!(closed.into_response().status(), StatusCode::CONFLICT);

        let transient = AppError::from(MarketplaceError::from(StoreError::Unavailable(
            "down".to_string(),
        )));
        assert_eq!(
            transient.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn config_errors_are_internal() {
        let error = AppError::from(ConfigError::Invalid {
            key: "APP_PORT",
            value: "abc".to_string(),
        });
        assert!(error.to_string().starts_with("configuration error"));
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
