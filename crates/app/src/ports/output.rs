//! Output driver port — the digital lines behind each relay.

use std::sync::Arc;

use growhub_domain::actuator::{OutputLevel, OutputLine};
use growhub_domain::error::GrowHubError;

/// Drives physical output lines.
///
/// Writes are synchronous: a single GPIO write is the only IO allowed while
/// the control loop holds actuator state.
pub trait OutputDriver: Send + Sync {
    /// Drive `line` to `level`.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::Output`] when the line cannot be written.
    fn write(&self, line: OutputLine, level: OutputLevel) -> Result<(), GrowHubError>;

    /// Give the lines back to the system. Called once, after every actuator
    /// has been disengaged.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::Output`] when cleanup fails.
    fn release(&self) -> Result<(), GrowHubError>;
}

impl<T: OutputDriver> OutputDriver for Arc<T> {
    fn write(&self, line: OutputLine, level: OutputLevel) -> Result<(), GrowHubError> {
        (**self).write(line, level)
    }

    fn release(&self) -> Result<(), GrowHubError> {
        (**self).release()
    }
}
