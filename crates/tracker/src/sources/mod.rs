//! Frame source and detector implementations.
//!
//! Live camera capture and cascade detection are external; the sources
//! here either replay a recorded detection log or simulate a subject in
//! front of the gimbal.

pub mod replay;
pub mod sim;

pub use replay::{RecordedDetector, ReplaySource};
pub use sim::{SimCamera, SimDetector, SimDriver, SimFrame, SimulatedRig, SubjectMotion};
