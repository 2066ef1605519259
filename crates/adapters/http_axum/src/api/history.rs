//! Logged readings over a trailing window.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use growhub_app::ports::AuditLog;
use growhub_domain::audit::ReadingRecord;
use growhub_domain::error::ValidationError;
use growhub_domain::time::{Timestamp, now};

use crate::error::ApiError;
use crate::state::AppState;

/// Default time range: last 24 hours.
const DEFAULT_HOURS: i64 = 24;

/// Query parameters for the history endpoint.
#[derive(Deserialize)]
pub struct HistoryQuery {
    /// Window length in hours. Defaults to 24.
    pub hours: Option<i64>,
}

/// One logged reading.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: Timestamp,
    pub temperature: f64,
    pub humidity: f64,
    pub heater_engaged: bool,
    pub humidifier_engaged: bool,
}

impl From<ReadingRecord> for HistoryEntry {
    fn from(record: ReadingRecord) -> Self {
        Self {
            timestamp: record.recorded_at,
            temperature: record.temperature,
            humidity: record.humidity,
            heater_engaged: record.actuators.heater,
            humidifier_engaged: record.actuators.humidifier,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryBody {
    pub status: &'static str,
    pub data: Vec<HistoryEntry>,
}

/// Possible responses from the history endpoint.
pub enum ListResponse {
    Ok(Json<HistoryBody>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

fn window_start(current: Timestamp, hours: i64) -> Result<Timestamp, ValidationError> {
    let invalid = || ValidationError::InvalidField {
        field: "hours",
        value: hours.to_string(),
    };
    if hours <= 0 {
        return Err(invalid());
    }
    TimeDelta::try_hours(hours)
        .and_then(|window| current.checked_sub_signed(window))
        .ok_or_else(invalid)
}

/// `GET /history?hours=N` — newest first.
pub async fn list<L>(
    State(state): State<AppState<L>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<ListResponse, ApiError>
where
    L: AuditLog + Send + Sync + 'static,
{
    let Query(params) = query?;
    let since = window_start(now(), params.hours.unwrap_or(DEFAULT_HOURS))?;

    let records = state.audit_log.readings_since(since).await?;

    Ok(ListResponse::Ok(Json(HistoryBody {
        status: "success",
        data: records.into_iter().map(HistoryEntry::from).collect(),
    })))
}
