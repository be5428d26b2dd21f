use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::infra::carrier::CarrierError;
use crate::service::QuoteError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error("carrier integration is not configured")]
    CarrierUnavailable,

    #[error("carrier error: {0}")]
    Carrier(CarrierError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedPayload(rejection.body_text())
    }
}

impl From<CarrierError> for AppError {
    fn from(err: CarrierError) -> Self {
        match err {
            CarrierError::NotConfigured => AppError::CarrierUnavailable,
            other => AppError::Carrier(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AppError::Quote(QuoteError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            AppError::Quote(QuoteError::FallbackExhausted) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CarrierUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Carrier(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestError;

    #[test]
    fn statuses_follow_error_kind() {
        let invalid = AppError::from(QuoteError::from(RequestError::InvalidWeight(0.0)));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let exhausted = AppError::from(QuoteError::FallbackExhausted);
        assert_eq!(
            exhausted.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let unconfigured = AppError::from(CarrierError::NotConfigured);
        assert_eq!(
            unconfigured.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let upstream = AppError::from(CarrierError::Status(500));
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn invalid_request_message_is_the_validation_error() {
        let err = AppError::from(QuoteError::from(RequestError::InvalidPostalCode(
            "123".into(),
        )));
        assert_eq!(
            err.to_string(),
            "invalid request: postal code `123` must contain exactly 8 digits"
        );
    }
}
