//! Gimbal Control Model
//!
//! Defines the data contracts shared by the controller, the tracking loop,
//! and the CLI:
//! - **Geometry:** frame extents, centroids, bounding boxes, axis identifiers
//! - **Detection:** recorded detection frames in JSONL form for replay
//! - **Config:** every tracking tunable plus driver and logging settings
//!
//! Coordinates are pixels in the source frame with the origin at the
//! top-left corner. Membership breakpoints are fractions of the frame
//! extent so the same configuration works at any resolution.

pub mod config;
pub mod detection;
pub mod geometry;

pub use config::*;
pub use detection::*;
pub use geometry::*;
