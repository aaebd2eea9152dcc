//! Gimbal Tracker
//!
//! Runs the fuzzy controller against live (or replayed, or simulated)
//! detections and pushes the resulting positions to servo drivers. Uses
//! pluggable capabilities so the loop never touches hardware directly:
//!
//! - **FrameSource:** delivers frames, reports drops and end of stream
//! - **Detector:** turns a frame into zero or more bounding boxes
//! - **ActuatorDriver:** accepts normalized positions for pan and tilt
//!
//! The loop is single-threaded and cooperative. An optional worker mode
//! moves detection onto a blocking task that publishes only the latest
//! observation.

pub mod drivers;
pub mod handoff;
pub mod manual;
pub mod perception;
pub mod selection;
pub mod sources;
pub mod tracking;

use gimbal_common::error::GimbalResult;
use gimbal_control_model::{AxisId, BoundingBox, FrameGeometry};

pub use drivers::{DriverGuard, MemoryDriver, SysfsPwmDriver};
pub use handoff::{spawn_detection_worker, DetectionWorker, LatestDetection, ObservationReceiver};
pub use manual::{ManualHarness, ManualInputError, ManualSession};
pub use perception::{Observation, Perceived, Perception, PerceptionStats};
pub use sources::{RecordedDetector, ReplaySource, SimulatedRig};
pub use tracking::{ControlStats, LoopState, TrackingLoop, TrackingReport};

/// Result of asking a frame source for the next frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameRead<F> {
    /// A frame is ready for detection.
    Frame(F),
    /// The camera failed to deliver this frame; try again next iteration.
    Dropped,
    /// The stream has ended.
    Closed,
}

/// Trait for frame acquisition backends.
pub trait FrameSource: Send {
    type Frame: Send;

    /// Block until the next frame is available.
    fn read(&mut self) -> GimbalResult<FrameRead<Self::Frame>>;

    /// Coordinate space of the frames this source delivers.
    fn geometry(&self) -> FrameGeometry;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Trait for subject detectors.
pub trait Detector<F>: Send {
    /// Zero or more subject rectangles, in no guaranteed order.
    fn detect(&mut self, frame: &F) -> GimbalResult<Vec<BoundingBox>>;

    /// Detector name for logging.
    fn name(&self) -> &str;
}

/// Trait for actuator hardware.
///
/// Positions are normalized and already clamped by the controller; the
/// driver only maps them to whatever the hardware needs.
pub trait ActuatorDriver: Send {
    /// Last position written for `axis`.
    fn get(&self, axis: AxisId) -> f64;

    /// Command `axis` to `value`.
    fn set(&mut self, axis: AxisId, value: f64) -> GimbalResult<()>;

    /// Detach from the hardware. Called once on shutdown.
    fn release(&mut self) -> GimbalResult<()>;

    /// Driver name for logging.
    fn name(&self) -> &str;
}
