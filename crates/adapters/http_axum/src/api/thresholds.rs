//! Threshold inspection and update.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use growhub_app::ports::AuditLog;
use growhub_domain::payload::ThresholdPayload;
use growhub_domain::threshold::Thresholds;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ThresholdsBody {
    pub status: &'static str,
    pub message: String,
    pub thresholds: Thresholds,
}

/// Possible responses from the thresholds endpoints.
pub enum ThresholdsResponse {
    Ok(Json<ThresholdsBody>),
}

impl IntoResponse for ThresholdsResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /thresholds`
pub async fn get<L>(State(state): State<AppState<L>>) -> Result<ThresholdsResponse, ApiError>
where
    L: AuditLog + Send + Sync + 'static,
{
    let snapshot = state.control.snapshot().await?;
    Ok(ThresholdsResponse::Ok(Json(ThresholdsBody {
        status: "success",
        message: "current thresholds".to_string(),
        thresholds: snapshot.thresholds,
    })))
}

/// `POST /thresholds` — nested `{temperature: {lowerBound, upperBound}, humidity: {…}}`
/// or the flat `temp_min` / `temp_max` / `humidity_min` / `humidity_max` keys.
///
/// An update leaving any pair inverted is rejected whole.
pub async fn update<L>(
    State(state): State<AppState<L>>,
    payload: Result<Json<ThresholdPayload>, JsonRejection>,
) -> Result<ThresholdsResponse, ApiError>
where
    L: AuditLog + Send + Sync + 'static,
{
    let Json(payload) = payload?;
    let update = payload.into_update()?;

    let thresholds = state.control.update_thresholds(update).await?;

    Ok(ThresholdsResponse::Ok(Json(ThresholdsBody {
        status: "success",
        message: "Thresholds updated successfully".to_string(),
        thresholds,
    })))
}
