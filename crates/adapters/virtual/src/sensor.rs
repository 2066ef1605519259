//! Virtual climate sensor.

use std::sync::Mutex;

use growhub_app::ports::SensorDriver;
use growhub_domain::error::GrowHubError;
use growhub_domain::reading::SensorReading;
use growhub_domain::time::now;
use tokio::time::Instant;

use crate::enclosure::Enclosure;

/// Sensor driver sampling an [`Enclosure`].
///
/// Each read advances the model by the time elapsed since the previous read,
/// then reports values rounded to the 0.1 resolution of a DHT22.
#[derive(Debug)]
pub struct VirtualSensor {
    enclosure: Enclosure,
    last_read: Mutex<Option<Instant>>,
}

impl VirtualSensor {
    #[must_use]
    pub fn new(enclosure: Enclosure) -> Self {
        Self {
            enclosure,
            last_read: Mutex::new(None),
        }
    }

    fn elapsed_seconds(&self) -> f64 {
        let current = Instant::now();
        let mut last_read = self
            .last_read
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let elapsed = last_read.map_or(0.0, |previous| (current - previous).as_secs_f64());
        *last_read = Some(current);
        elapsed
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl SensorDriver for VirtualSensor {
    async fn read(&self) -> Result<SensorReading, GrowHubError> {
        let elapsed = self.elapsed_seconds();
        if self.enclosure.take_read_failure() {
            return Err(GrowHubError::SensorUnavailable(
                "virtual sensor checksum mismatch".into(),
            ));
        }
        self.enclosure.step(elapsed);
        let (temperature, humidity) = self.enclosure.climate();
        Ok(SensorReading::new(
            round_tenth(temperature),
            round_tenth(humidity),
            now(),
        ))
    }
}
