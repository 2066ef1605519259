//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use growhub_domain::error::{GrowHubError, ValidationError};

use crate::api::Reply;

/// Maps [`GrowHubError`] to an HTTP response with appropriate status code.
///
/// The body always has the `{status: "error", message}` shape.
#[derive(Debug)]
pub struct ApiError(GrowHubError);

impl From<GrowHubError> for ApiError {
    fn from(err: GrowHubError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(GrowHubError::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from(ValidationError::InvalidField {
            field: "body",
            value: rejection.body_text(),
        })
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::from(ValidationError::InvalidField {
            field: "query",
            value: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            GrowHubError::Validation(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            GrowHubError::UnknownActuator(err) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
            }
            GrowHubError::ControlLoopClosed => (
                StatusCode::SERVICE_UNAVAILABLE,
                "controller is shutting down".to_string(),
            ),
            GrowHubError::Output(err) => {
                tracing::error!(error = %err, "actuator output failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "actuator output failure".to_string(),
                )
            }
            GrowHubError::SensorUnavailable(err)
            | GrowHubError::Storage(err)
            | GrowHubError::Publication(err) => {
                tracing::error!(error = %err, kind = %self.0, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(Reply::error(message))).into_response()
    }
}
