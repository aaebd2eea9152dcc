//! In-memory driver used for dry runs and tests.

use gimbal_common::error::{GimbalError, GimbalResult};
use gimbal_control_model::AxisId;

use crate::ActuatorDriver;

/// Records every command instead of moving hardware.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    pan: f64,
    tilt: f64,
    history: Vec<(AxisId, f64)>,
    released: bool,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `set` call in order.
    pub fn history(&self) -> &[(AxisId, f64)] {
        &self.history
    }

    /// Commands sent to one axis in order.
    pub fn history_for(&self, axis: AxisId) -> Vec<f64> {
        self.history
            .iter()
            .filter(|(a, _)| *a == axis)
            .map(|(_, value)| *value)
            .collect()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl ActuatorDriver for MemoryDriver {
    fn get(&self, axis: AxisId) -> f64 {
        match axis {
            AxisId::Pan => self.pan,
            AxisId::Tilt => self.tilt,
        }
    }

    fn set(&mut self, axis: AxisId, value: f64) -> GimbalResult<()> {
        if self.released {
            return Err(GimbalError::actuator(format!(
                "{axis} command after release"
            )));
        }
        match axis {
            AxisId::Pan => self.pan = value,
            AxisId::Tilt => self.tilt = value,
        }
        self.history.push((axis, value));
        Ok(())
    }

    fn release(&mut self) -> GimbalResult<()> {
        self.released = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
