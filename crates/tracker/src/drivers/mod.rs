//! Actuator driver implementations.

pub mod guard;
pub mod memory;
pub mod sysfs_pwm;

pub use guard::DriverGuard;
pub use memory::MemoryDriver;
pub use sysfs_pwm::{pulse_width_ns, SysfsPwmDriver};
