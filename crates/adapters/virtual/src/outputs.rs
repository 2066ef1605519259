//! Virtual relay board.

use growhub_app::ports::OutputDriver;
use growhub_domain::actuator::{OutputLevel, OutputLine};
use growhub_domain::error::GrowHubError;

use crate::enclosure::Enclosure;

/// Output driver writing line levels into an [`Enclosure`].
#[derive(Debug, Clone)]
pub struct VirtualOutputs {
    enclosure: Enclosure,
}

impl VirtualOutputs {
    #[must_use]
    pub fn new(enclosure: Enclosure) -> Self {
        Self { enclosure }
    }

    /// Last level written to `pin`.
    #[must_use]
    pub fn level(&self, pin: u8) -> Option<OutputLevel> {
        self.enclosure.level(pin)
    }
}

impl OutputDriver for VirtualOutputs {
    fn write(&self, line: OutputLine, level: OutputLevel) -> Result<(), GrowHubError> {
        if !self.enclosure.write_level(line.pin, level) {
            return Err(GrowHubError::Output(
                format!("virtual line {} refused write", line.pin).into(),
            ));
        }
        tracing::debug!(pin = line.pin, ?level, "virtual line written");
        Ok(())
    }

    fn release(&self) -> Result<(), GrowHubError> {
        self.enclosure.mark_released();
        tracing::debug!("virtual lines released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use growhub_domain::actuator::{ActuatorId, PinMap};

    #[test]
    fn should_engage_relay_in_enclosure() {
        let enclosure = Enclosure::default();
        let outputs = VirtualOutputs::new(enclosure.clone());
        let line = PinMap::default().line(ActuatorId::Heater).unwrap();

        outputs.write(line, line.level_for(true)).unwrap();

        assert!(enclosure.is_engaged(ActuatorId::Heater));
        assert_eq!(outputs.level(21), Some(OutputLevel::Low));
    }

    #[test]
    fn should_fail_write_when_injected() {
        let enclosure = Enclosure::default();
        let outputs = VirtualOutputs::new(enclosure.clone());
        enclosure.fail_writes(true);
        let line = PinMap::default().line(ActuatorId::Heater).unwrap();

        let result = outputs.write(line, line.level_for(true));

        assert!(matches!(result, Err(GrowHubError::Output(_))));
        assert!(outputs.level(21).is_none());
    }

    #[test]
    fn should_mark_enclosure_released() {
        let enclosure = Enclosure::default();
        VirtualOutputs::new(enclosure.clone()).release().unwrap();
        assert!(enclosure.is_released());
    }
}
