//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod control;
#[allow(clippy::missing_errors_doc)]
pub mod history;
#[allow(clippy::missing_errors_doc)]
pub mod pump;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod status;
#[allow(clippy::missing_errors_doc)]
pub mod thresholds;

use axum::Router;
use axum::routing::{get, post};
use serde::Serialize;

use growhub_app::ports::AuditLog;
use growhub_domain::command::SubmitOutcome;
use growhub_domain::error::{GrowHubError, UnknownActuatorError};

use crate::error::ApiError;
use crate::state::AppState;

/// `{status, message}` body shared by every command endpoint.
#[derive(Debug, Serialize)]
pub struct Reply {
    pub status: &'static str,
    pub message: String,
}

impl Reply {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

/// Turn a dispatcher outcome into a reply, or an error for a target
/// without an output line.
fn reply_for(outcome: SubmitOutcome) -> Result<Reply, ApiError> {
    match outcome {
        SubmitOutcome::InvalidTarget(actuator) => Err(ApiError::from(GrowHubError::from(
            UnknownActuatorError { actuator },
        ))),
        outcome => Ok(Reply::success(outcome.message())),
    }
}

/// Build the API sub-router, mounted both under `/api` and at the root.
pub fn routes<L>() -> Router<AppState<L>>
where
    L: AuditLog + Send + Sync + 'static,
{
    Router::new()
        .route("/status", get(status::get::<L>))
        .route("/status/stream", get(sse::stream::<L>))
        .route("/control", post(control::submit::<L>))
        .route("/pump", post(pump::submit::<L>))
        .route("/history", get(history::list::<L>))
        .route(
            "/thresholds",
            get(thresholds::get::<L>).post(thresholds::update::<L>),
        )
}
