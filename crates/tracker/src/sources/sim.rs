//! Closed-loop simulation of a subject in front of the gimbal.
//!
//! The subject sits at a fixed (or drifting) angular position expressed in
//! normalized actuator units. Its apparent pixel position depends on where
//! the simulated servos currently point, so commands written through
//! [`SimDriver`] show up in the next frame read from [`SimCamera`].

use std::sync::{Arc, Mutex, MutexGuard};

use gimbal_common::error::{GimbalError, GimbalResult};
use gimbal_control_model::{AxisId, BoundingBox, Centroid, FrameGeometry};

use crate::{ActuatorDriver, Detector, FrameRead, FrameSource};

/// Per-frame subject drift in actuator units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubjectMotion {
    pub pan_per_frame: f64,
    pub tilt_per_frame: f64,
}

#[derive(Debug)]
struct SimState {
    subject_pan: f64,
    subject_tilt: f64,
    motion: SubjectMotion,
    pan: f64,
    tilt: f64,
    frame: u64,
    frame_limit: Option<u64>,
    drop_every: Option<u64>,
    released: bool,
}

/// Shared simulation state plus handles onto it.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    state: Arc<Mutex<SimState>>,
    geometry: FrameGeometry,
    /// Pixels the subject moves per unit of actuator travel.
    pixels_per_unit: (f64, f64),
    subject_size: (f64, f64),
}

impl SimulatedRig {
    pub fn new(geometry: FrameGeometry) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                subject_pan: 0.0,
                subject_tilt: 0.0,
                motion: SubjectMotion::default(),
                pan: 0.0,
                tilt: 0.0,
                frame: 0,
                frame_limit: None,
                drop_every: None,
                released: false,
            })),
            geometry,
            pixels_per_unit: (geometry.width / 2.0, geometry.height / 2.0),
            subject_size: (geometry.width / 10.0, geometry.height / 4.0),
        }
    }

    /// Place the subject at the given actuator-space position.
    pub fn with_subject(self, pan: f64, tilt: f64) -> Self {
        {
            let mut state = self.lock();
            state.subject_pan = pan;
            state.subject_tilt = tilt;
        }
        self
    }

    pub fn with_motion(self, motion: SubjectMotion) -> Self {
        self.lock().motion = motion;
        self
    }

    /// Close the camera after `frames` frames.
    pub fn with_frame_limit(self, frames: u64) -> Self {
        self.lock().frame_limit = Some(frames);
        self
    }

    /// Drop every `n`th frame.
    pub fn with_drop_every(self, n: u64) -> Self {
        self.lock().drop_every = Some(n.max(1));
        self
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn camera(&self) -> SimCamera {
        SimCamera { rig: self.clone() }
    }

    pub fn detector(&self) -> SimDetector {
        SimDetector
    }

    pub fn driver(&self) -> SimDriver {
        SimDriver { rig: self.clone() }
    }

    /// Where the subject's center currently appears in the frame.
    pub fn apparent_center(&self) -> Centroid {
        let state = self.lock();
        self.project(&state)
    }

    /// Current simulated servo positions `(pan, tilt)`.
    pub fn actuator_positions(&self) -> (f64, f64) {
        let state = self.lock();
        (state.pan, state.tilt)
    }

    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn project(&self, state: &SimState) -> Centroid {
        let center = self.geometry.center();
        Centroid::new(
            center.x + (state.pan - state.subject_pan) * self.pixels_per_unit.0,
            center.y + (state.subject_tilt - state.tilt) * self.pixels_per_unit.1,
        )
    }

    fn in_frame(&self, point: Centroid) -> bool {
        (0.0..=self.geometry.width).contains(&point.x)
            && (0.0..=self.geometry.height).contains(&point.y)
    }
}

/// A rendered simulation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimFrame {
    pub index: u64,
    /// The subject's bounding box, if it is inside the frame.
    pub subject: Option<BoundingBox>,
}

/// Camera view of the simulated rig.
#[derive(Debug, Clone)]
pub struct SimCamera {
    rig: SimulatedRig,
}

impl FrameSource for SimCamera {
    type Frame = SimFrame;

    fn read(&mut self) -> GimbalResult<FrameRead<SimFrame>> {
        let mut state = self.rig.lock();
        if state.frame_limit.is_some_and(|limit| state.frame >= limit) {
            return Ok(FrameRead::Closed);
        }

        let index = state.frame;
        state.frame += 1;
        let motion = state.motion;
        state.subject_pan += motion.pan_per_frame;
        state.subject_tilt += motion.tilt_per_frame;

        if state.drop_every.is_some_and(|n| (index + 1) % n == 0) {
            return Ok(FrameRead::Dropped);
        }

        let center = self.rig.project(&state);
        let (w, h) = self.rig.subject_size;
        let subject = self
            .rig
            .in_frame(center)
            .then(|| BoundingBox::new(center.x - w / 2.0, center.y - h / 2.0, w, h));

        Ok(FrameRead::Frame(SimFrame { index, subject }))
    }

    fn geometry(&self) -> FrameGeometry {
        self.rig.geometry
    }

    fn name(&self) -> &str {
        "sim-camera"
    }
}

/// Reports the simulated subject whenever it is in view.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimDetector;

impl Detector<SimFrame> for SimDetector {
    fn detect(&mut self, frame: &SimFrame) -> GimbalResult<Vec<BoundingBox>> {
        Ok(frame.subject.into_iter().collect())
    }

    fn name(&self) -> &str {
        "sim-detector"
    }
}

/// Servo driver that moves the simulated mount.
#[derive(Debug, Clone)]
pub struct SimDriver {
    rig: SimulatedRig,
}

impl ActuatorDriver for SimDriver {
    fn get(&self, axis: AxisId) -> f64 {
        let state = self.rig.lock();
        match axis {
            AxisId::Pan => state.pan,
            AxisId::Tilt => state.tilt,
        }
    }

    fn set(&mut self, axis: AxisId, value: f64) -> GimbalResult<()> {
        let mut state = self.rig.lock();
        if state.released {
            return Err(GimbalError::actuator(format!("{axis} command after release")));
        }
        match axis {
            AxisId::Pan => state.pan = value,
            AxisId::Tilt => state.tilt = value,
        }
        Ok(())
    }

    fn release(&mut self) -> GimbalResult<()> {
        self.rig.lock().released = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "sim-driver"
    }
}
