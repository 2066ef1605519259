//! # growhub-adapter-virtual
//!
//! Simulated hardware for development and testing.
//!
//! A shared [`Enclosure`] holds a tiny thermal model: temperature and humidity
//! drift towards ambient, the heater and the humidifier push them up while
//! their relay is closed.
//!
//! | Driver | Port | Behaviour |
//! |--------|------|-----------|
//! | [`VirtualSensor`] | `SensorDriver` | Advances the model by the elapsed time and samples it |
//! | [`VirtualOutputs`] | `OutputDriver` | Records line levels; the model reads them back |
//!
//! Both drivers can be told to fail, to exercise the error paths of the
//! control loop without real hardware.
//!
//! ## Dependency rule
//!
//! Depends on `growhub-app` (port traits) and `growhub-domain` only.

mod enclosure;
mod outputs;
mod sensor;

pub use enclosure::{Enclosure, EnclosureConfig};
pub use outputs::VirtualOutputs;
pub use sensor::VirtualSensor;
