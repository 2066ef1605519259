//! Actuator controller — hysteresis evaluation and the single state mutator.

use growhub_domain::actuator::{ActuatorId, ActuatorStates, PinMap};
use growhub_domain::command::{Applied, ApplyOutcome, Command};
use growhub_domain::error::GrowHubError;
use growhub_domain::reading::{Quantity, SensorReading};
use growhub_domain::threshold::Thresholds;
use growhub_domain::time::Timestamp;

use crate::ports::OutputDriver;

/// Owner of every actuator's logical state and of the output driver.
///
/// Not synchronised itself: it lives inside the control loop, which is the
/// only caller of [`apply`](Self::apply).
pub struct ActuatorController<O> {
    driver: O,
    pins: PinMap,
    states: ActuatorStates,
}

impl<O: OutputDriver> ActuatorController<O> {
    /// Every actuator starts disengaged.
    pub fn new(driver: O, pins: PinMap) -> Self {
        Self {
            driver,
            pins,
            states: ActuatorStates::default(),
        }
    }

    #[must_use]
    pub fn states(&self) -> ActuatorStates {
        self.states
    }

    #[must_use]
    pub fn is_engaged(&self, id: ActuatorId) -> bool {
        self.states.is_engaged(id)
    }

    /// Commands the hysteresis rule wants for `reading`.
    ///
    /// At most one per quantity, never one that restates the current state.
    /// Pumps are never touched here.
    #[must_use]
    pub fn evaluate(
        &self,
        reading: &SensorReading,
        thresholds: &Thresholds,
        now: Timestamp,
    ) -> Vec<Command> {
        Quantity::ALL
            .into_iter()
            .filter_map(|quantity| {
                let target = quantity.actuator();
                thresholds
                    .for_quantity(quantity)
                    .decide(reading.value(quantity), self.is_engaged(target))
                    .map(|desired| Command::automatic(target, desired, now))
            })
            .collect()
    }

    /// Drive the output line, then record the new logical state.
    ///
    /// An actuator without a mapped line is rejected with no side effect.
    ///
    /// # Errors
    ///
    /// Returns [`GrowHubError::Output`] when the driver fails; the logical
    /// state is left as it was.
    pub fn apply(&mut self, command: &Command) -> Result<ApplyOutcome, GrowHubError> {
        let line = match self.pins.line(command.target) {
            Ok(line) => line,
            Err(err) => return Ok(ApplyOutcome::Rejected(err)),
        };
        self.driver
            .write(line, line.level_for(command.desired_state))?;
        let changed = self.states.is_engaged(command.target) != command.desired_state;
        self.states.set(command.target, command.desired_state);
        if changed {
            tracing::info!(
                actuator = %command.target,
                engaged = command.desired_state,
                origin = %command.origin,
                command_id = %command.id,
                "actuator switched"
            );
        }
        Ok(ApplyOutcome::Applied(Applied {
            target: command.target,
            engaged: command.desired_state,
            changed,
        }))
    }

    /// Write the released level to every mapped line.
    ///
    /// # Errors
    ///
    /// Returns the first driver failure; remaining lines are still attempted.
    pub fn initialize(&mut self) -> Result<(), GrowHubError> {
        self.release_all()
    }

    /// Drive every actuator off, whatever its logical state.
    ///
    /// # Errors
    ///
    /// Returns the first driver failure; remaining lines are still attempted.
    pub fn disengage_all(&mut self) -> Result<(), GrowHubError> {
        self.release_all()
    }

    /// Hand the output lines back to the system.
    ///
    /// # Errors
    ///
    /// Returns the driver's cleanup failure.
    pub fn release(self) -> Result<(), GrowHubError> {
        self.driver.release()
    }

    fn release_all(&mut self) -> Result<(), GrowHubError> {
        let mut first_error = None;
        for id in ActuatorId::ALL {
            let Ok(line) = self.pins.line(id) else {
                continue;
            };
            match self.driver.write(line, line.level_for(false)) {
                Ok(()) => self.states.set(id, false),
                Err(err) => {
                    tracing::error!(actuator = %id, error = %err, "failed to release actuator");
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use growhub_domain::actuator::{OutputLevel, OutputLine};
    use growhub_domain::command::CommandOrigin;
    use growhub_domain::error::UnknownActuatorError;
    use growhub_domain::threshold::Threshold;
    use growhub_domain::time::now;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Records every level written, and the last one per pin.
    #[derive(Default)]
    pub(crate) struct RecordingOutputs {
        pub(crate) levels: Mutex<HashMap<u8, OutputLevel>>,
        pub(crate) history: Mutex<Vec<(u8, OutputLevel)>>,
        pub(crate) writes: Mutex<usize>,
        pub(crate) failing: Mutex<bool>,
        pub(crate) released: Mutex<bool>,
    }

    impl RecordingOutputs {
        pub(crate) fn level(&self, pin: u8) -> Option<OutputLevel> {
            self.levels.lock().unwrap().get(&pin).copied()
        }

        /// Levels written to `pin`, oldest first.
        pub(crate) fn history(&self, pin: u8) -> Vec<OutputLevel> {
            self.history
                .lock()
                .unwrap()
                .iter()
                .filter(|(written, _)| *written == pin)
                .map(|(_, level)| *level)
                .collect()
        }

        pub(crate) fn write_count(&self) -> usize {
            *self.writes.lock().unwrap()
        }

        pub(crate) fn fail(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    impl OutputDriver for RecordingOutputs {
        fn write(&self, line: OutputLine, level: OutputLevel) -> Result<(), GrowHubError> {
            if *self.failing.lock().unwrap() {
                return Err(GrowHubError::Output("line busy".into()));
            }
            self.levels.lock().unwrap().insert(line.pin, level);
            self.history.lock().unwrap().push((line.pin, level));
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }

        fn release(&self) -> Result<(), GrowHubError> {
            *self.released.lock().unwrap() = true;
            Ok(())
        }
    }

    fn controller() -> (Arc<RecordingOutputs>, ActuatorController<Arc<RecordingOutputs>>) {
        let outputs = Arc::new(RecordingOutputs::default());
        let controller = ActuatorController::new(Arc::clone(&outputs), PinMap::default());
        (outputs, controller)
    }

    fn reading(temperature: f64, humidity: f64) -> SensorReading {
        SensorReading::new(temperature, humidity, now())
    }

    #[test]
    fn should_follow_hysteresis_sequence_for_heater() {
        let (_, mut controller) = controller();
        let thresholds = Thresholds::default();
        let mut trace = Vec::new();

        for temperature in [24.9, 25.1, 27.9, 28.0, 24.0] {
            for command in controller.evaluate(&reading(temperature, 70.0), &thresholds, now()) {
                controller.apply(&command).unwrap();
            }
            trace.push(controller.is_engaged(ActuatorId::Heater));
        }

        assert_eq!(trace, vec![true, true, true, false, true]);
    }

    #[test]
    fn should_emit_nothing_when_state_already_matches() {
        let (_, mut controller) = controller();
        let thresholds = Thresholds::default();
        let cold_and_dry = reading(20.0, 40.0);

        let first = controller.evaluate(&cold_and_dry, &thresholds, now());
        assert_eq!(first.len(), 2);
        for command in &first {
            controller.apply(command).unwrap();
        }

        assert!(controller.evaluate(&cold_and_dry, &thresholds, now()).is_empty());
    }

    #[test]
    fn should_emit_one_automatic_command_per_quantity() {
        let (_, controller) = controller();
        let commands = controller.evaluate(&reading(20.0, 40.0), &Thresholds::default(), now());
        let targets: Vec<_> = commands.iter().map(|c| c.target).collect();
        assert_eq!(targets, vec![ActuatorId::Heater, ActuatorId::Humidifier]);
        assert!(commands.iter().all(|c| c.origin == CommandOrigin::Automatic));
        assert!(commands.iter().all(|c| c.desired_state));
    }

    #[test]
    fn should_drive_humidifier_with_its_own_bounds() {
        let (_, mut controller) = controller();
        let thresholds = Thresholds {
            humidity: Threshold::new(50.0, 55.0).unwrap(),
            ..Thresholds::default()
        };
        for command in controller.evaluate(&reading(26.0, 49.0), &thresholds, now()) {
            controller.apply(&command).unwrap();
        }
        assert!(controller.is_engaged(ActuatorId::Humidifier));
        assert!(!controller.is_engaged(ActuatorId::Heater));

        let commands = controller.evaluate(&reading(26.0, 55.0), &thresholds, now());
        assert_eq!(commands.len(), 1);
        assert!(!commands[0].desired_state);
    }

    #[test]
    fn should_never_evaluate_pumps() {
        let (_, controller) = controller();
        let commands = controller.evaluate(&reading(-10.0, 0.0), &Thresholds::default(), now());
        assert!(commands.iter().all(|c| c.target.is_automatic()));
    }

    #[test]
    fn should_write_active_low_level_when_engaging() {
        let (outputs, mut controller) = controller();
        let command = Command::operator(None, ActuatorId::PrimaryPump, true, now());

        let outcome = controller.apply(&command).unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Applied(Applied {
                target: ActuatorId::PrimaryPump,
                engaged: true,
                changed: true,
            })
        );
        assert_eq!(outputs.level(19), Some(OutputLevel::Low));
    }

    #[test]
    fn should_report_unchanged_when_reapplying_same_state() {
        let (_, mut controller) = controller();
        let command = Command::operator(None, ActuatorId::Heater, false, now());
        let outcome = controller.apply(&command).unwrap();
        assert!(matches!(
            outcome,
            ApplyOutcome::Applied(Applied { changed: false, .. })
        ));
    }

    #[test]
    fn should_reject_unmapped_actuator_without_writing() {
        let outputs = Arc::new(RecordingOutputs::default());
        let pins = PinMap {
            auxiliary_pump: None,
            ..PinMap::default()
        };
        let mut controller = ActuatorController::new(Arc::clone(&outputs), pins);
        let command = Command::operator(None, ActuatorId::AuxiliaryPump, true, now());

        let outcome = controller.apply(&command).unwrap();

        assert_eq!(
            outcome,
            ApplyOutcome::Rejected(UnknownActuatorError {
                actuator: ActuatorId::AuxiliaryPump
            })
        );
        assert_eq!(outputs.write_count(), 0);
        assert!(!controller.is_engaged(ActuatorId::AuxiliaryPump));
    }

    #[test]
    fn should_keep_state_when_driver_fails() {
        let (outputs, mut controller) = controller();
        outputs.fail(true);
        let command = Command::operator(None, ActuatorId::Heater, true, now());

        let result = controller.apply(&command);

        assert!(matches!(result, Err(GrowHubError::Output(_))));
        assert!(!controller.is_engaged(ActuatorId::Heater));
    }

    #[test]
    fn should_release_every_line_when_disengaging_all() {
        let (outputs, mut controller) = controller();
        for id in ActuatorId::ALL {
            controller
                .apply(&Command::operator(None, id, true, now()))
                .unwrap();
        }

        controller.disengage_all().unwrap();

        assert_eq!(controller.states(), ActuatorStates::default());
        for pin in [18, 19, 20, 21] {
            assert_eq!(outputs.level(pin), Some(OutputLevel::High));
        }
    }

    #[test]
    fn should_write_released_level_on_initialize() {
        let (outputs, mut controller) = controller();
        controller.initialize().unwrap();
        assert_eq!(outputs.write_count(), 4);
        assert_eq!(outputs.level(21), Some(OutputLevel::High));
    }
}
