//! `SQLite` implementation of [`AuditLog`].

use chrono::SecondsFormat;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use growhub_app::ports::AuditLog;
use growhub_domain::actuator::{ActuatorId, ActuatorStates};
use growhub_domain::audit::{CommandRecord, ReadingRecord, SystemEvent};
use growhub_domain::command::WaterState;
use growhub_domain::error::GrowHubError;
use growhub_domain::id::ReadingRecordId;
use growhub_domain::time::Timestamp;

use crate::error::StorageError;

/// Fixed precision keeps stored timestamps ordered under text comparison.
fn encode_timestamp(at: Timestamp) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|at| at.to_utc())
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

struct Wrapper(ReadingRecord);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let recorded_at: String = row.try_get("recorded_at")?;

        Ok(Self(ReadingRecord {
            id: ReadingRecordId::from_uuid(id),
            recorded_at: decode_timestamp(&recorded_at)?,
            temperature: row.try_get("temperature")?,
            humidity: row.try_get("humidity")?,
            actuators: ActuatorStates {
                heater: row.try_get("heater_engaged")?,
                humidifier: row.try_get("humidifier_engaged")?,
                primary_pump: row.try_get("primary_pump_engaged")?,
                auxiliary_pump: row.try_get("auxiliary_pump_engaged")?,
            },
        }))
    }
}

const INSERT_READING: &str = r"
    INSERT INTO sensor_readings (
        id, recorded_at, temperature, humidity,
        heater_engaged, humidifier_engaged, primary_pump_engaged, auxiliary_pump_engaged
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const INSERT_COMMAND: &str = r"
    INSERT INTO command_records (
        id, command_id, origin, target, action, water_state,
        min_sensor, max_sensor, outcome, recorded_at
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const INSERT_EVENT: &str = r"
    INSERT INTO system_events (id, event_type, description, data, recorded_at)
    VALUES (?, ?, ?, ?, ?)
";

const SELECT_READINGS_SINCE: &str =
    "SELECT * FROM sensor_readings WHERE recorded_at >= ? ORDER BY recorded_at DESC";

const PURGE_READINGS: &str = "DELETE FROM sensor_readings WHERE recorded_at < ?";
const PURGE_COMMANDS: &str = "DELETE FROM command_records WHERE recorded_at < ?";
const PURGE_EVENTS: &str = "DELETE FROM system_events WHERE recorded_at < ?";

/// `SQLite`-backed audit log.
pub struct SqliteAuditLog {
    pool: SqlitePool,
}

impl SqliteAuditLog {
    /// Create a new audit log using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AuditLog for SqliteAuditLog {
    async fn record_reading(&self, record: ReadingRecord) -> Result<(), GrowHubError> {
        sqlx::query(INSERT_READING)
            .bind(record.id.as_uuid())
            .bind(encode_timestamp(record.recorded_at))
            .bind(record.temperature)
            .bind(record.humidity)
            .bind(record.actuators.heater)
            .bind(record.actuators.humidifier)
            .bind(record.actuators.primary_pump)
            .bind(record.actuators.auxiliary_pump)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn record_command(&self, record: CommandRecord) -> Result<(), GrowHubError> {
        sqlx::query(INSERT_COMMAND)
            .bind(record.id.as_uuid())
            .bind(record.command_id.as_str())
            .bind(record.origin.as_str())
            .bind(record.target.map(ActuatorId::as_str))
            .bind(record.action.as_str())
            .bind(record.water_state.map(WaterState::as_str))
            .bind(record.min_sensor)
            .bind(record.max_sensor)
            .bind(record.outcome.as_str())
            .bind(encode_timestamp(record.recorded_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn record_event(&self, event: SystemEvent) -> Result<(), GrowHubError> {
        let data = event
            .data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::from)?;

        sqlx::query(INSERT_EVENT)
            .bind(event.id.as_uuid())
            .bind(event.event_type.as_str())
            .bind(&event.description)
            .bind(data)
            .bind(encode_timestamp(event.recorded_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }

    async fn readings_since(&self, since: Timestamp) -> Result<Vec<ReadingRecord>, GrowHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_READINGS_SINCE)
            .bind(encode_timestamp(since))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, GrowHubError> {
        let cutoff = encode_timestamp(cutoff);
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        let mut removed = 0;
        for statement in [PURGE_READINGS, PURGE_COMMANDS, PURGE_EVENTS] {
            removed += sqlx::query(statement)
                .bind(&cutoff)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?
                .rows_affected();
        }

        tx.commit().await.map_err(StorageError::from)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use chrono::TimeDelta;
    use growhub_domain::audit::{CommandOutcome, SystemEventType};
    use growhub_domain::command::{Command, CompanionReport, RequestedAction};
    use growhub_domain::time::now;

    async fn setup() -> (SqliteAuditLog, SqlitePool) {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let pool = db.pool().clone();
        (SqliteAuditLog::new(pool.clone()), pool)
    }

    fn reading_at(recorded_at: Timestamp, temperature: f64) -> ReadingRecord {
        ReadingRecord {
            id: ReadingRecordId::new(),
            recorded_at,
            temperature,
            humidity: 65.0,
            actuators: ActuatorStates {
                heater: true,
                ..ActuatorStates::default()
            },
        }
    }

    async fn count(pool: &SqlitePool, table: &str) -> i64 {
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .unwrap();
        row.0
    }

    #[tokio::test]
    async fn should_return_readings_newest_first() {
        let (log, _) = setup().await;
        let at = now();
        log.record_reading(reading_at(at - TimeDelta::minutes(2), 24.0))
            .await
            .unwrap();
        log.record_reading(reading_at(at - TimeDelta::minutes(1), 25.0))
            .await
            .unwrap();

        let readings = log.readings_since(at - TimeDelta::hours(1)).await.unwrap();

        assert_eq!(readings.len(), 2);
        assert!((readings[0].temperature - 25.0).abs() < f64::EPSILON);
        assert!((readings[1].temperature - 24.0).abs() < f64::EPSILON);
        assert!(readings[0].actuators.heater);
        assert!(!readings[0].actuators.auxiliary_pump);
    }

    #[tokio::test]
    async fn should_exclude_readings_before_window() {
        let (log, _) = setup().await;
        let at = now();
        log.record_reading(reading_at(at - TimeDelta::hours(30), 20.0))
            .await
            .unwrap();
        log.record_reading(reading_at(at - TimeDelta::hours(2), 21.0))
            .await
            .unwrap();

        let readings = log.readings_since(at - TimeDelta::hours(24)).await.unwrap();

        assert_eq!(readings.len(), 1);
        assert!((readings[0].temperature - 21.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_preserve_recorded_at_through_storage() {
        let (log, _) = setup().await;
        let record = reading_at(now(), 26.5);

        log.record_reading(record).await.unwrap();

        let stored = log
            .readings_since(record.recorded_at)
            .await
            .unwrap()
            .pop()
            .unwrap();
        assert_eq!(stored.id, record.id);
        assert_eq!(
            stored.recorded_at.timestamp_micros(),
            record.recorded_at.timestamp_micros()
        );
    }

    #[tokio::test]
    async fn should_store_operator_command_record() {
        let (log, pool) = setup().await;
        let command = Command::operator(None, ActuatorId::PrimaryPump, true, now());
        let record = CommandRecord::for_command(&command, CommandOutcome::Applied, now());

        log.record_command(record).await.unwrap();

        let row: (String, String, Option<String>, String) = sqlx::query_as(
            "SELECT origin, action, target, outcome FROM command_records WHERE command_id = ?",
        )
        .bind(command.id.as_str())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row.0, "operator");
        assert_eq!(row.1, "ON");
        assert_eq!(row.2.as_deref(), Some("primary_pump"));
        assert_eq!(row.3, "applied");
    }

    #[tokio::test]
    async fn should_store_companion_report_without_target() {
        let (log, pool) = setup().await;
        let report = CompanionReport::builder()
            .water_state(WaterState::High)
            .requested_action(RequestedAction::None)
            .max_sensor(3.2)
            .build()
            .unwrap();
        let record = CommandRecord::for_report(&report, None, CommandOutcome::Recorded, now());

        log.record_command(record).await.unwrap();

        let row: (Option<String>, Option<String>, Option<f64>, Option<f64>) = sqlx::query_as(
            "SELECT target, water_state, min_sensor, max_sensor FROM command_records",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(row.0.is_none());
        assert_eq!(row.1.as_deref(), Some("HIGH"));
        assert!(row.2.is_none());
        assert_eq!(row.3, Some(3.2));
    }

    #[tokio::test]
    async fn should_store_system_event_with_json_data() {
        let (log, pool) = setup().await;
        let event = SystemEvent::new(SystemEventType::ThresholdsUpdated, "thresholds changed", now())
            .with_data(serde_json::json!({"temperature": {"lowerBound": 22.0}}));

        log.record_event(event).await.unwrap();

        let row: (String, Option<String>) =
            sqlx::query_as("SELECT event_type, data FROM system_events")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(row.0, "thresholds_updated");
        let data: serde_json::Value = serde_json::from_str(&row.1.unwrap()).unwrap();
        assert_eq!(data["temperature"]["lowerBound"], 22.0);
    }

    #[tokio::test]
    async fn should_purge_records_older_than_cutoff_across_tables() {
        let (log, pool) = setup().await;
        let at = now();
        let old = at - TimeDelta::days(31);
        log.record_reading(reading_at(old, 20.0)).await.unwrap();
        log.record_reading(reading_at(at, 21.0)).await.unwrap();
        let command = Command::operator(None, ActuatorId::Heater, true, old);
        log.record_command(CommandRecord::for_command(&command, CommandOutcome::Applied, old))
            .await
            .unwrap();
        log.record_event(SystemEvent::new(SystemEventType::Startup, "started", old))
            .await
            .unwrap();
        log.record_event(SystemEvent::new(SystemEventType::Shutdown, "stopped", at))
            .await
            .unwrap();

        let removed = log.purge_before(at - TimeDelta::days(30)).await.unwrap();

        assert_eq!(removed, 3);
        assert_eq!(count(&pool, "sensor_readings").await, 1);
        assert_eq!(count(&pool, "command_records").await, 0);
        assert_eq!(count(&pool, "system_events").await, 1);
    }

    #[tokio::test]
    async fn should_purge_nothing_when_everything_is_recent() {
        let (log, _) = setup().await;
        log.record_reading(reading_at(now(), 22.0)).await.unwrap();

        let removed = log
            .purge_before(now() - TimeDelta::days(30))
            .await
            .unwrap();

        assert_eq!(removed, 0);
    }
}
