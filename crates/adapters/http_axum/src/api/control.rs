//! Operator relay control.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};

use growhub_app::ports::AuditLog;
use growhub_domain::payload::RelayControlPayload;
use growhub_domain::time::now;

use crate::api::{Reply, reply_for};
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the control endpoint.
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

/// `POST /control` — `{actuator, desiredState, commandId?}`
pub async fn submit<L>(
    State(state): State<AppState<L>>,
    payload: Result<Json<RelayControlPayload>, JsonRejection>,
) -> Result<SubmitResponse, ApiError>
where
    L: AuditLog + Send + Sync + 'static,
{
    let Json(payload) = payload?;
    let command = payload.into_command(now())?;
    tracing::debug!(actuator = %command.target, engaged = command.desired_state, "operator command received");

    let outcome = state.control.submit(command).await?;

    Ok(SubmitResponse::Ok(Json(reply_for(outcome)?)))
}
