//! Gimbal Common Utilities
//!
//! Shared infrastructure for all gimbal crates:
//! - Error types and result aliases
//! - Session clock, cadence budget, and status throttling for the loop
//! - Tracing/logging initialization
//! - Configuration file location and JSON persistence

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
