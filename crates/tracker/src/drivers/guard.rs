//! Scoped ownership of an actuator driver.

use std::ops::{Deref, DerefMut};

use gimbal_common::error::GimbalResult;

use crate::ActuatorDriver;

/// Releases the wrapped driver when dropped, on every exit path.
pub struct DriverGuard<A: ActuatorDriver> {
    driver: Option<A>,
}

impl<A: ActuatorDriver> DriverGuard<A> {
    pub fn new(driver: A) -> Self {
        Self {
            driver: Some(driver),
        }
    }

    /// Release now and hand the driver back.
    pub fn release(mut self) -> GimbalResult<A> {
        let mut driver = self.take();
        driver.release()?;
        tracing::debug!(driver = %driver.name(), "Driver released");
        Ok(driver)
    }

    fn take(&mut self) -> A {
        match self.driver.take() {
            Some(driver) => driver,
            // Only `release` and `drop` take, and both consume the guard.
            None => unreachable!("driver guard already released"),
        }
    }
}

impl<A: ActuatorDriver> Deref for DriverGuard<A> {
    type Target = A;

    fn deref(&self) -> &A {
        match &self.driver {
            Some(driver) => driver,
            None => unreachable!("driver guard already released"),
        }
    }
}

impl<A: ActuatorDriver> DerefMut for DriverGuard<A> {
    fn deref_mut(&mut self) -> &mut A {
        match &mut self.driver {
            Some(driver) => driver,
            None => unreachable!("driver guard already released"),
        }
    }
}

impl<A: ActuatorDriver> Drop for DriverGuard<A> {
    fn drop(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            match driver.release() {
                Ok(()) => tracing::debug!(driver = %driver.name(), "Driver released on drop"),
                Err(e) => tracing::warn!(
                    driver = %driver.name(),
                    error = %e,
                    "Failed to release driver"
                ),
            }
        }
    }
}
