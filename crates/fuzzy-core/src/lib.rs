//! Gimbal Fuzzy Core: the controller
//!
//! Turns a subject centroid into bounded actuator commands:
//! - **Membership:** fuzzify a coordinate into exiting/centered/exiting degrees
//! - **Rules:** pick hold, soft correction, or hard correction
//! - **Actuator:** clamped cumulative position per axis
//! - **Axis:** scale a decision by the axis strength profile and apply it
//! - **Controller:** run the whole chain for pan and tilt
//!
//! This crate is pure computation with no I/O or hardware access.
//! Given the same centroid, configuration, and actuator state it always
//! produces the same commands.

pub mod actuator;
pub mod axis;
pub mod controller;
pub mod membership;
pub mod rules;

pub use actuator::ActuatorAxis;
pub use axis::AxisController;
pub use controller::{AxisDecision, FrameDecision, GimbalController};
pub use membership::{MembershipEvaluator, MembershipVector};
pub use rules::{decide, Action, Direction, RuleEngine, Tier};
