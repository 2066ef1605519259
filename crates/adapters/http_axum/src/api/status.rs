//! Current controller status.

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use growhub_app::ports::AuditLog;
use growhub_domain::snapshot::StatusDocument;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the status endpoint.
pub enum GetResponse {
    Ok(Json<StatusDocument>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /status`
pub async fn get<L>(State(state): State<AppState<L>>) -> Result<GetResponse, ApiError>
where
    L: AuditLog + Send + Sync + 'static,
{
    let snapshot = state.control.snapshot().await?;
    Ok(GetResponse::Ok(Json(StatusDocument::from(&snapshot))))
}
