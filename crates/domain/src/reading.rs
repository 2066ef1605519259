//! Sensor readings and the quantities they carry.

use serde::{Deserialize, Serialize};

use crate::actuator::ActuatorId;
use crate::time::Timestamp;

/// One complete sample from the climate sensor.
///
/// Replaced wholesale by the next reading, never patched field by field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Percent relative humidity.
    pub humidity: f64,
    pub observed_at: Timestamp,
}

impl SensorReading {
    #[must_use]
    pub fn new(temperature: f64, humidity: f64, observed_at: Timestamp) -> Self {
        Self {
            temperature,
            humidity,
            observed_at,
        }
    }

    /// Value of the given controlled quantity.
    #[must_use]
    pub fn value(&self, quantity: Quantity) -> f64 {
        match quantity {
            Quantity::Temperature => self.temperature,
            Quantity::Humidity => self.humidity,
        }
    }
}

/// A controlled quantity, each paired with the actuator that raises it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Temperature,
    Humidity,
}

impl Quantity {
    pub const ALL: [Self; 2] = [Self::Temperature, Self::Humidity];

    /// Actuator the automatic evaluator drives for this quantity.
    #[must_use]
    pub fn actuator(self) -> ActuatorId {
        match self {
            Self::Temperature => ActuatorId::Heater,
            Self::Humidity => ActuatorId::Humidifier,
        }
    }
}
