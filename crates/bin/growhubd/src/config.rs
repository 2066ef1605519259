//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `growhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use chrono::TimeDelta;
use growhub_adapter_mqtt::MqttConfig;
use growhub_adapter_virtual::EnclosureConfig;
use growhub_app::dispatcher::DispatcherConfig;
use growhub_app::scheduler::SchedulerConfig;
use growhub_domain::actuator::{ActuatorId, PinMap};
use growhub_domain::threshold::{Threshold, Thresholds};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Control-loop tunables.
    pub control: ControlConfig,
    /// Output pin table.
    pub outputs: PinMap,
    /// Simulated enclosure behind the virtual drivers.
    pub simulation: EnclosureConfig,
    /// Push/subscribe transport.
    pub mqtt: MqttSection,
    /// Audit log retention.
    pub retention: RetentionConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Cadences, thresholds and companion handling.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub sample_interval_secs: u64,
    pub evaluate_interval_secs: u64,
    pub publish_interval_secs: u64,
    /// Upper bound for one publication attempt, and for the offline notice
    /// sent at shutdown.
    pub publish_timeout_secs: u64,
    pub log_interval_secs: u64,
    pub purge_interval_secs: u64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub humidity_min: f64,
    pub humidity_max: f64,
    /// Seconds without contact after which the companion counts as offline.
    pub companion_timeout_secs: i64,
    /// Actuator switched by companion pump requests.
    pub companion_target: ActuatorId,
    /// How long a command id is remembered.
    pub dedup_window_secs: i64,
    pub dedup_capacity: usize,
    /// Depth of the control-loop and outbound channels.
    pub channel_capacity: usize,
}

/// MQTT toggle plus connection settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MqttSection {
    pub enabled: bool,
    #[serde(flatten)]
    pub connection: MqttConfig,
}

/// How long audit records are kept.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub days: i64,
}

impl Config {
    /// Load configuration from `growhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("growhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("GROWHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("GROWHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("GROWHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("GROWHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("GROWHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("GROWHUB_MQTT_ENABLED") {
            self.mqtt.enabled = matches!(val.trim(), "1" | "true" | "yes" | "on");
        }
        if let Some(val) = var("GROWHUB_MQTT_HOST") {
            self.mqtt.connection.broker_host = val;
        }
        if let Some(port) = var("GROWHUB_MQTT_PORT").and_then(|val| val.parse().ok()) {
            self.mqtt.connection.broker_port = port;
        }
        if let Some(val) = var("GROWHUB_DEVICE_ID") {
            self.mqtt.connection.device_id = val;
        }
        if let Some(days) = var("GROWHUB_RETENTION_DAYS").and_then(|val| val.parse().ok()) {
            self.retention.days = days;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.dispatcher_config()?;
        self.outputs
            .validate()
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        let control = &self.control;
        let intervals = [
            ("sample_interval_secs", control.sample_interval_secs),
            ("evaluate_interval_secs", control.evaluate_interval_secs),
            ("publish_interval_secs", control.publish_interval_secs),
            ("publish_timeout_secs", control.publish_timeout_secs),
            ("log_interval_secs", control.log_interval_secs),
            ("purge_interval_secs", control.purge_interval_secs),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::Validation(format!("{name} must be non-zero")));
        }
        if control.companion_timeout_secs <= 0 {
            return Err(ConfigError::Validation(
                "companion_timeout_secs must be positive".to_string(),
            ));
        }
        if control.dedup_window_secs <= 0 || control.dedup_capacity == 0 {
            return Err(ConfigError::Validation(
                "dedup window and capacity must be positive".to_string(),
            ));
        }
        if self.retention.days <= 0 || TimeDelta::try_days(self.retention.days).is_none() {
            return Err(ConfigError::Validation(
                "retention days must be a positive number of days".to_string(),
            ));
        }
        if self.mqtt.enabled {
            let device_id = &self.mqtt.connection.device_id;
            if device_id.is_empty() || device_id.contains(['/', '+', '#']) {
                return Err(ConfigError::Validation(format!(
                    "invalid mqtt device id `{device_id}`"
                )));
            }
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Startup threshold set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an invalid pair.
    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        let control = &self.control;
        let pair = |lower, upper, name: &str| {
            Threshold::new(lower, upper)
                .map_err(|err| ConfigError::Validation(format!("{name} thresholds: {err}")))
        };
        Ok(Thresholds {
            temperature: pair(
                control.temperature_min,
                control.temperature_max,
                "temperature",
            )?,
            humidity: pair(control.humidity_min, control.humidity_max, "humidity")?,
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for invalid thresholds or an
    /// out-of-range duration.
    pub fn dispatcher_config(&self) -> Result<DispatcherConfig, ConfigError> {
        let control = &self.control;
        let seconds = |secs, name: &str| {
            TimeDelta::try_seconds(secs)
                .ok_or_else(|| ConfigError::Validation(format!("{name} is out of range")))
        };
        Ok(DispatcherConfig {
            companion_target: control.companion_target,
            contact_timeout: seconds(control.companion_timeout_secs, "companion_timeout_secs")?,
            dedup_window: seconds(control.dedup_window_secs, "dedup_window_secs")?,
            dedup_capacity: control.dedup_capacity,
            thresholds: self.thresholds()?,
        })
    }

    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        let control = &self.control;
        SchedulerConfig {
            sample_interval: Duration::from_secs(control.sample_interval_secs),
            evaluate_interval: Duration::from_secs(control.evaluate_interval_secs),
            publish_interval: Duration::from_secs(control.publish_interval_secs),
            publish_timeout: self.publish_timeout(),
            log_interval: Duration::from_secs(control.log_interval_secs),
            purge_interval: Duration::from_secs(control.purge_interval_secs),
            retention: TimeDelta::try_days(self.retention.days).unwrap_or(TimeDelta::days(30)),
        }
    }

    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.control.publish_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:growhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "growhubd=info,growhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        let scheduler = SchedulerConfig::default();
        let dispatcher = DispatcherConfig::default();
        Self {
            sample_interval_secs: scheduler.sample_interval.as_secs(),
            evaluate_interval_secs: scheduler.evaluate_interval.as_secs(),
            publish_interval_secs: scheduler.publish_interval.as_secs(),
            publish_timeout_secs: scheduler.publish_timeout.as_secs(),
            log_interval_secs: scheduler.log_interval.as_secs(),
            purge_interval_secs: scheduler.purge_interval.as_secs(),
            temperature_min: dispatcher.thresholds.temperature.lower_bound,
            temperature_max: dispatcher.thresholds.temperature.upper_bound,
            humidity_min: dispatcher.thresholds.humidity.lower_bound,
            humidity_max: dispatcher.thresholds.humidity.upper_bound,
            companion_timeout_secs: dispatcher.contact_timeout.num_seconds(),
            companion_target: dispatcher.companion_target,
            dedup_window_secs: dispatcher.dedup_window.num_seconds(),
            dedup_capacity: dispatcher.dedup_capacity,
            channel_capacity: growhub_app::control::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { days: 30 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn overridden(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.url, "sqlite:growhub.db?mode=rwc");
        assert!(!config.mqtt.enabled);
        assert_eq!(config.retention.days, 30);
        assert_eq!(config.control.companion_target, ActuatorId::AuxiliaryPump);
        assert_eq!(config.outputs, PinMap::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.thresholds().unwrap(), Thresholds::default());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [control]
            sample_interval_secs = 2
            temperature_min = 22.0
            temperature_max = 26.5
            companion_timeout_secs = 60
            companion_target = 'primary_pump'

            [outputs]
            heater = 5
            humidifier = 6
            primary_pump = 13
            auxiliary_pump = 19
            active_low = false

            [simulation]
            ambient_temperature = 18.0

            [mqtt]
            enabled = true
            broker_host = 'mqtt.local'
            device_id = 'tent-2'

            [retention]
            days = 7
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.control.sample_interval_secs, 2);
        assert_eq!(config.control.companion_target, ActuatorId::PrimaryPump);
        assert_eq!(config.outputs.heater, Some(5));
        assert!(!config.outputs.active_low);
        assert!((config.simulation.ambient_temperature - 18.0).abs() < f64::EPSILON);
        assert!(config.mqtt.enabled);
        assert_eq!(config.mqtt.connection.broker_host, "mqtt.local");
        assert_eq!(config.mqtt.connection.broker_port, 1883);
        assert_eq!(config.mqtt.connection.device_id, "tent-2");
        assert_eq!(config.retention.days, 7);

        let thresholds = config.thresholds().unwrap();
        assert_eq!(thresholds.temperature, Threshold::new(22.0, 26.5).unwrap());
        assert_eq!(thresholds.humidity, Thresholds::default().humidity);
        let dispatcher = config.dispatcher_config().unwrap();
        assert_eq!(dispatcher.contact_timeout, TimeDelta::seconds(60));
        assert_eq!(
            config.scheduler_config().sample_interval,
            Duration::from_secs(2)
        );
        assert_eq!(config.scheduler_config().retention, TimeDelta::days(7));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_inverted_thresholds() {
        let mut config = Config::default();
        config.control.humidity_min = 90.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.starts_with("humidity")));
    }

    #[test]
    fn should_reject_shared_output_pin() {
        let mut config = Config::default();
        config.outputs.humidifier = config.outputs.heater;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_interval() {
        let mut config = Config::default();
        config.control.evaluate_interval_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(msg) if msg.contains("evaluate_interval_secs"))
        );
    }

    #[test]
    fn should_reject_non_positive_retention() {
        let mut config = Config::default();
        config.retention.days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_wildcard_device_id_when_mqtt_enabled() {
        let mut config = Config::default();
        config.mqtt.connection.device_id = "tent/+".to_string();
        assert!(config.validate().is_ok());
        config.mqtt.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_apply_environment_overrides() {
        let config = overridden(&[
            ("GROWHUB_BIND", "127.0.0.1:8080"),
            ("GROWHUB_DATABASE_URL", "sqlite::memory:"),
            ("GROWHUB_LOG", "warn"),
            ("GROWHUB_MQTT_ENABLED", "true"),
            ("GROWHUB_MQTT_HOST", "broker"),
            ("GROWHUB_MQTT_PORT", "8883"),
            ("GROWHUB_DEVICE_ID", "tent-3"),
            ("GROWHUB_RETENTION_DAYS", "14"),
        ]);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.logging.filter, "warn");
        assert!(config.mqtt.enabled);
        assert_eq!(config.mqtt.connection.broker_host, "broker");
        assert_eq!(config.mqtt.connection.broker_port, 8883);
        assert_eq!(config.mqtt.connection.device_id, "tent-3");
        assert_eq!(config.retention.days, 14);
    }

    #[test]
    fn should_let_rust_log_win_over_growhub_log() {
        let config = overridden(&[("GROWHUB_LOG", "warn"), ("RUST_LOG", "trace")]);
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparseable_port_override() {
        let config = overridden(&[("GROWHUB_PORT", "http")]);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn should_format_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
    }
}
