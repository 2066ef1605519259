//! Hysteresis thresholds and the two-point switching rule.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::reading::Quantity;

/// Engage/disengage bounds for one controlled quantity.
///
/// Invariant: both bounds are finite and `lower_bound < upper_bound`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Threshold {
    pub lower_bound: f64,
    pub upper_bound: f64,
}

impl Threshold {
    /// Build a validated threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NonFiniteBound`] or
    /// [`ValidationError::InvertedBounds`] when the invariant does not hold.
    pub fn new(lower_bound: f64, upper_bound: f64) -> Result<Self, ValidationError> {
        if !lower_bound.is_finite() || !upper_bound.is_finite() {
            return Err(ValidationError::NonFiniteBound);
        }
        if lower_bound >= upper_bound {
            return Err(ValidationError::InvertedBounds {
                lower: lower_bound,
                upper: upper_bound,
            });
        }
        Ok(Self {
            lower_bound,
            upper_bound,
        })
    }

    /// Two-point hysteresis decision.
    ///
    /// Returns the state the paired actuator must switch to, or `None` when it
    /// should stay as it is. Engages strictly below `lower_bound`, releases at
    /// or above `upper_bound`; inside the dead-band the current state persists.
    /// Never returns the current state.
    #[must_use]
    pub fn decide(&self, value: f64, engaged: bool) -> Option<bool> {
        if value < self.lower_bound && !engaged {
            Some(true)
        } else if value >= self.upper_bound && engaged {
            Some(false)
        } else {
            None
        }
    }
}

/// The process-wide threshold set, one pair per quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub temperature: Threshold,
    pub humidity: Threshold,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature: Threshold {
                lower_bound: 25.0,
                upper_bound: 28.0,
            },
            humidity: Threshold {
                lower_bound: 60.0,
                upper_bound: 80.0,
            },
        }
    }
}

impl Thresholds {
    #[must_use]
    pub fn for_quantity(&self, quantity: Quantity) -> Threshold {
        match quantity {
            Quantity::Temperature => self.temperature,
            Quantity::Humidity => self.humidity,
        }
    }

    /// Produce the threshold set that results from a partial update.
    ///
    /// Fields absent from `update` keep their current value. The whole result
    /// is validated before anything is returned, so a rejected update never
    /// leaves a half-applied set behind.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if either resulting pair is invalid.
    pub fn apply(&self, update: &ThresholdUpdate) -> Result<Self, ValidationError> {
        let temperature = Threshold::new(
            update
                .temperature_lower
                .unwrap_or(self.temperature.lower_bound),
            update
                .temperature_upper
                .unwrap_or(self.temperature.upper_bound),
        )?;
        let humidity = Threshold::new(
            update.humidity_lower.unwrap_or(self.humidity.lower_bound),
            update.humidity_upper.unwrap_or(self.humidity.upper_bound),
        )?;
        Ok(Self {
            temperature,
            humidity,
        })
    }

    /// Check both pairs.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Threshold::new(self.temperature.lower_bound, self.temperature.upper_bound)?;
        Threshold::new(self.humidity.lower_bound, self.humidity.upper_bound)?;
        Ok(())
    }
}

/// A partial threshold change requested by the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub temperature_lower: Option<f64>,
    pub temperature_upper: Option<f64>,
    pub humidity_lower: Option<f64>,
    pub humidity_upper: Option<f64>,
}

impl ThresholdUpdate {
    /// Whether the update carries no field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature_lower.is_none()
            && self.temperature_upper.is_none()
            && self.humidity_lower.is_none()
            && self.humidity_upper.is_none()
    }
}
