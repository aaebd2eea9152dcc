//! Clamped cumulative actuator position.

use gimbal_common::error::{GimbalError, GimbalResult};
use gimbal_control_model::ActuatorRange;
use serde::Serialize;

/// Normalized position of one actuator, always within `[min, max]`.
///
/// Fields are private so the only ways to move the position are
/// [`ActuatorAxis::apply_delta`] and [`ActuatorAxis::home`], both of which
/// clamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActuatorAxis {
    position: f64,
    min: f64,
    max: f64,
}

impl ActuatorAxis {
    /// Create an axis at `initial`, clamped into `range`.
    pub fn new(range: ActuatorRange, initial: f64) -> GimbalResult<Self> {
        let ActuatorRange { min, max } = range;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(GimbalError::config(format!(
                "actuator range requires finite min < max (got [{min}, {max}])"
            )));
        }
        let mut axis = Self {
            position: min,
            min,
            max,
        };
        axis.home(initial);
        Ok(axis)
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn range(&self) -> ActuatorRange {
        ActuatorRange {
            min: self.min,
            max: self.max,
        }
    }

    /// Whether the position sits on either end of the range.
    pub fn is_saturated(&self) -> bool {
        self.position <= self.min || self.position >= self.max
    }

    /// Move by `delta`, saturating at the range ends. Returns the new
    /// position.
    ///
    /// A zero or NaN delta leaves the position untouched.
    pub fn apply_delta(&mut self, delta: f64) -> f64 {
        if delta == 0.0 || delta.is_nan() {
            return self.position;
        }
        self.position = (self.position + delta).clamp(self.min, self.max);
        self.position
    }

    /// Set the position directly, clamped. NaN is ignored.
    pub fn home(&mut self, value: f64) -> f64 {
        if !value.is_nan() {
            self.position = value.clamp(self.min, self.max);
        }
        self.position
    }
}

/// Apply a signed delta to `axis`.
pub fn apply_delta(axis: &mut ActuatorAxis, delta: f64) {
    axis.apply_delta(delta);
}

/// Drive `axis` straight to `value`.
pub fn home(axis: &mut ActuatorAxis, value: f64) {
    axis.home(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_axis() -> ActuatorAxis {
        ActuatorAxis::new(ActuatorRange::default(), 0.0).unwrap()
    }

    #[test]
    fn test_zero_delta_is_a_no_op() {
        let mut axis = unit_axis();
        axis.apply_delta(0.3);
        let before = axis;
        apply_delta(&mut axis, 0.0);
        assert_eq!(axis, before);
    }

    #[test]
    fn test_delta_accumulates() {
        let mut axis = unit_axis();
        axis.apply_delta(0.25);
        axis.apply_delta(-0.5);
        assert!((axis.position() + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_overshoot_saturates() {
        let mut axis = unit_axis();
        assert_eq!(axis.apply_delta(5.0), 1.0);
        assert!(axis.is_saturated());
        assert_eq!(axis.apply_delta(f64::NEG_INFINITY), -1.0);
    }

    #[test]
    fn test_nan_delta_is_ignored() {
        let mut axis = unit_axis();
        axis.apply_delta(f64::NAN);
        assert_eq!(axis.position(), 0.0);
    }

    #[test]
    fn test_home_clamps() {
        let mut axis = unit_axis();
        home(&mut axis, 3.0);
        assert_eq!(axis.position(), 1.0);
        home(&mut axis, -0.4);
        assert_eq!(axis.position(), -0.4);
    }

    #[test]
    fn test_initial_position_is_clamped() {
        let axis = ActuatorAxis::new(ActuatorRange { min: 0.0, max: 0.5 }, 0.9).unwrap();
        assert_eq!(axis.position(), 0.5);
    }

    #[test]
    fn test_invalid_range_is_rejected() {
        assert!(ActuatorAxis::new(ActuatorRange { min: 1.0, max: -1.0 }, 0.0).is_err());
        assert!(ActuatorAxis::new(
            ActuatorRange {
                min: f64::NEG_INFINITY,
                max: 1.0
            },
            0.0
        )
        .is_err());
    }
}
