//! Sensor driver port — temperature and humidity samples.

use std::future::Future;
use std::sync::Arc;

use growhub_domain::error::GrowHubError;
use growhub_domain::reading::SensorReading;

/// Produces complete climate readings.
pub trait SensorDriver {
    /// Take one sample.
    ///
    /// Implementations return [`GrowHubError::SensorUnavailable`] on failure;
    /// callers keep the previous reading.
    fn read(&self) -> impl Future<Output = Result<SensorReading, GrowHubError>> + Send;
}

impl<T: SensorDriver + Send + Sync> SensorDriver for Arc<T> {
    fn read(&self) -> impl Future<Output = Result<SensorReading, GrowHubError>> + Send {
        (**self).read()
    }
}
