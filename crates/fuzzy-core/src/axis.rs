//! Per-axis execution of rule decisions.

use gimbal_control_model::{Polarity, StrengthProfile};

use crate::actuator::ActuatorAxis;
use crate::rules::{Action, Tier};

/// Scales actions by an axis strength profile and applies them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisController {
    profile: StrengthProfile,
    polarity: Polarity,
}

impl AxisController {
    pub fn new(profile: StrengthProfile, polarity: Polarity) -> Self {
        Self { profile, polarity }
    }

    pub fn profile(&self) -> StrengthProfile {
        self.profile
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Signed delta for `action` before it touches any actuator.
    pub fn delta_for(&self, action: Action) -> f64 {
        delta_for(action, &self.profile) * self.polarity.sign()
    }

    /// Apply `action` to `axis`. Returns the commanded delta; the axis
    /// position reflects any clamping at the range ends.
    pub fn step(&self, axis: &mut ActuatorAxis, action: Action) -> f64 {
        let delta = self.delta_for(action);
        axis.apply_delta(delta);
        delta
    }
}

/// Delta for `action` under `profile` with normal polarity.
pub fn delta_for(action: Action, profile: &StrengthProfile) -> f64 {
    match action {
        Action::Hold => 0.0,
        Action::Correct {
            direction,
            tier: Tier::Soft,
        } => direction.sign() * profile.soft * profile.fine_adjustment_multiplier,
        Action::Correct {
            direction,
            tier: Tier::Hard,
        } => direction.sign() * profile.hard,
    }
}

/// Apply `action` to `axis` with normal polarity.
pub fn step(axis: &mut ActuatorAxis, action: Action, profile: &StrengthProfile) -> f64 {
    AxisController::new(*profile, Polarity::Normal).step(axis, action)
}
