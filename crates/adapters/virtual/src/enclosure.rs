//! Shared enclosure model behind both virtual drivers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use growhub_domain::actuator::{ActuatorId, OutputLevel, PinMap};
use serde::Deserialize;

/// Physical constants of the simulated enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnclosureConfig {
    pub ambient_temperature: f64,
    pub ambient_humidity: f64,
    /// Fraction of the gap to ambient closed per second.
    pub leak_rate: f64,
    /// °C per second added while the heater is on.
    pub heating_rate: f64,
    /// %RH per second added while the humidifier is on.
    pub humidifying_rate: f64,
}

impl Default for EnclosureConfig {
    fn default() -> Self {
        Self {
            ambient_temperature: 22.0,
            ambient_humidity: 50.0,
            leak_rate: 0.002,
            heating_rate: 0.02,
            humidifying_rate: 0.1,
        }
    }
}

#[derive(Debug)]
struct State {
    temperature: f64,
    humidity: f64,
    levels: HashMap<u8, OutputLevel>,
    failing_reads: u32,
    failing_writes: bool,
    released: bool,
}

/// Cloneable handle on one simulated enclosure.
#[derive(Debug, Clone)]
pub struct Enclosure {
    config: EnclosureConfig,
    pins: PinMap,
    state: Arc<Mutex<State>>,
}

impl Enclosure {
    /// Starts at ambient with every line unset.
    #[must_use]
    pub fn new(config: EnclosureConfig, pins: PinMap) -> Self {
        Self {
            config,
            pins,
            state: Arc::new(Mutex::new(State {
                temperature: config.ambient_temperature,
                humidity: config.ambient_humidity,
                levels: HashMap::new(),
                failing_reads: 0,
                failing_writes: false,
                released: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the relay of `id` is closed, judged from its line level.
    #[must_use]
    pub fn is_engaged(&self, id: ActuatorId) -> bool {
        let Ok(line) = self.pins.line(id) else {
            return false;
        };
        self.lock().levels.get(&line.pin) == Some(&line.level_for(true))
    }

    /// Current temperature and humidity.
    #[must_use]
    pub fn climate(&self) -> (f64, f64) {
        let state = self.lock();
        (state.temperature, state.humidity)
    }

    /// Force the climate, e.g. to start a scenario away from ambient.
    pub fn set_climate(&self, temperature: f64, humidity: f64) {
        let mut state = self.lock();
        state.temperature = temperature;
        state.humidity = humidity.clamp(0.0, 100.0);
    }

    /// Advance the model by `seconds`.
    pub fn step(&self, seconds: f64) {
        let heating = self.is_engaged(ActuatorId::Heater);
        let humidifying = self.is_engaged(ActuatorId::Humidifier);
        let config = self.config;
        let mut state = self.lock();

        let leak = (config.leak_rate * seconds).min(1.0);
        state.temperature += (config.ambient_temperature - state.temperature) * leak;
        state.humidity += (config.ambient_humidity - state.humidity) * leak;
        if heating {
            state.temperature += config.heating_rate * seconds;
        }
        if humidifying {
            state.humidity += config.humidifying_rate * seconds;
        }
        state.humidity = state.humidity.clamp(0.0, 100.0);
    }

    /// Make the next `count` sensor reads fail.
    pub fn fail_reads(&self, count: u32) {
        self.lock().failing_reads = count;
    }

    /// Make every line write fail until switched back.
    pub fn fail_writes(&self, failing: bool) {
        self.lock().failing_writes = failing;
    }

    /// Whether the outputs were handed back.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    /// Consume one pending read failure, if any.
    pub(crate) fn take_read_failure(&self) -> bool {
        let mut state = self.lock();
        if state.failing_reads == 0 {
            return false;
        }
        state.failing_reads -= 1;
        true
    }

    pub(crate) fn write_level(&self, pin: u8, level: OutputLevel) -> bool {
        let mut state = self.lock();
        if state.failing_writes {
            return false;
        }
        state.levels.insert(pin, level);
        true
    }

    pub(crate) fn level(&self, pin: u8) -> Option<OutputLevel> {
        self.lock().levels.get(&pin).copied()
    }

    pub(crate) fn mark_released(&self) {
        self.lock().released = true;
    }
}

impl Default for Enclosure {
    fn default() -> Self {
        Self::new(EnclosureConfig::default(), PinMap::default())
    }
}
