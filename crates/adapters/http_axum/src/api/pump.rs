//! Companion node pump reports.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};

use growhub_app::ports::AuditLog;
use growhub_domain::payload::CompanionPayload;
use growhub_domain::time::now;

use crate::api::{Reply, reply_for};
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the pump endpoint.
pub enum SubmitResponse {
    Ok(Json<Reply>),
}

impl IntoResponse for SubmitResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `POST /pump` — `{waterState, requestedAction, commandId?, nodeId?, minSensor?, maxSensor?}`
///
/// The firmware's `water_state` / `pump_command` keys are accepted too.
pub async fn submit<L>(
    State(state): State<AppState<L>>,
    payload: Result<Json<CompanionPayload>, JsonRejection>,
) -> Result<SubmitResponse, ApiError>
where
    L: AuditLog + Send + Sync + 'static,
{
    let Json(payload) = payload?;
    let report = payload.into_report(None, now())?;
    tracing::debug!(
        water_state = %report.water_state,
        action = %report.requested_action,
        "companion report received"
    );

    let outcome = state.control.submit(report).await?;

    Ok(SubmitResponse::Ok(Json(reply_for(outcome)?)))
}
