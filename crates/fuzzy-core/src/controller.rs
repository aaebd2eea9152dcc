//! Two-axis controller: centroid in, clamped actuator positions out.

use gimbal_common::error::GimbalResult;
use gimbal_control_model::{AxisId, Centroid, FrameGeometry, TrackingConfig};
use serde::Serialize;

use crate::actuator::ActuatorAxis;
use crate::axis::AxisController;
use crate::membership::{MembershipEvaluator, MembershipVector};
use crate::rules::{Action, RuleEngine};

/// Everything decided for one axis on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisDecision {
    pub axis: AxisId,
    /// Centroid component the decision was made from (pixels).
    pub coordinate: f64,
    pub membership: MembershipVector,
    pub action: Action,
    /// Commanded delta, after polarity.
    pub delta: f64,
    /// Actuator position after the delta was applied.
    pub position: f64,
}

/// Decisions for both axes on one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameDecision {
    pub centroid: Centroid,
    pub pan: AxisDecision,
    pub tilt: AxisDecision,
}

impl FrameDecision {
    pub fn get(&self, axis: AxisId) -> &AxisDecision {
        match axis {
            AxisId::Pan => &self.pan,
            AxisId::Tilt => &self.tilt,
        }
    }

    /// Whether neither axis moves this frame.
    pub fn is_hold(&self) -> bool {
        self.pan.action == Action::Hold && self.tilt.action == Action::Hold
    }
}

#[derive(Debug, Clone)]
struct AxisChannel {
    id: AxisId,
    home: f64,
    controller: AxisController,
    state: ActuatorAxis,
}

/// Fuzzy controller for pan and tilt.
///
/// Holds the only persistent state of the tracker: the two actuator
/// positions. Everything else is recomputed from the current centroid.
#[derive(Debug, Clone)]
pub struct GimbalController {
    geometry: FrameGeometry,
    evaluator: MembershipEvaluator,
    rules: RuleEngine,
    pan: AxisChannel,
    tilt: AxisChannel,
}

impl GimbalController {
    /// Build a controller from validated configuration. Actuators start at
    /// their home positions.
    pub fn new(config: &TrackingConfig) -> GimbalResult<Self> {
        config.validate()?;

        let channel = |id: AxisId| -> GimbalResult<AxisChannel> {
            let axis = config.axis(id);
            Ok(AxisChannel {
                id,
                home: axis.home,
                controller: AxisController::new(axis.profile, axis.polarity),
                state: ActuatorAxis::new(axis.range, axis.home)?,
            })
        };

        Ok(Self {
            geometry: config.geometry,
            evaluator: MembershipEvaluator::new(config.pan.band, config.tilt.band),
            rules: RuleEngine::new(config.thresholds).with_soft_direction(config.soft_direction),
            pan: channel(AxisId::Pan)?,
            tilt: channel(AxisId::Tilt)?,
        })
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn channel(&self, axis: AxisId) -> &AxisChannel {
        match axis {
            AxisId::Pan => &self.pan,
            AxisId::Tilt => &self.tilt,
        }
    }

    fn channel_mut(&mut self, axis: AxisId) -> &mut AxisChannel {
        match axis {
            AxisId::Pan => &mut self.pan,
            AxisId::Tilt => &mut self.tilt,
        }
    }

    pub fn actuator(&self, axis: AxisId) -> &ActuatorAxis {
        &self.channel(axis).state
    }

    pub fn position(&self, axis: AxisId) -> f64 {
        self.channel(axis).state.position()
    }

    /// Drive both actuators to their configured home positions.
    pub fn home(&mut self) -> (f64, f64) {
        for axis in AxisId::ALL {
            let channel = self.channel_mut(axis);
            channel.state.home(channel.home);
        }
        (self.position(AxisId::Pan), self.position(AxisId::Tilt))
    }

    /// Drive one actuator to an explicit position (clamped).
    pub fn set_position(&mut self, axis: AxisId, value: f64) -> f64 {
        self.channel_mut(axis).state.home(value)
    }

    /// Membership and action for one axis without touching any actuator.
    pub fn assess(&self, axis: AxisId, centroid: Centroid) -> (MembershipVector, Action) {
        let orientation = axis.orientation();
        let membership =
            self.evaluator
                .evaluate(centroid.component(orientation), &self.geometry, orientation);
        (membership, self.rules.decide(&membership))
    }

    /// Run one control step for both axes.
    pub fn update(&mut self, centroid: Centroid) -> FrameDecision {
        FrameDecision {
            centroid,
            pan: self.update_axis(AxisId::Pan, centroid),
            tilt: self.update_axis(AxisId::Tilt, centroid),
        }
    }

    fn update_axis(&mut self, axis: AxisId, centroid: Centroid) -> AxisDecision {
        let (membership, action) = self.assess(axis, centroid);
        let channel = self.channel_mut(axis);
        let delta = channel.controller.step(&mut channel.state, action);

        tracing::trace!(
            axis = %channel.id,
            action = %action,
            delta,
            position = channel.state.position(),
            "Axis step"
        );

        AxisDecision {
            axis,
            coordinate: centroid.component(axis.orientation()),
            membership,
            action,
            delta,
            position: channel.state.position(),
        }
    }
}
