//! Scope guard returning pins to the system.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use super::HARDWARE_TARGET;
use super::pins::PinDriver;

/// Calls [`PinDriver::release_all`] when dropped, including during unwinding.
pub struct PinReleaseGuard<P>
where
    P: PinDriver,
{
    driver: P,
}

impl<P> PinReleaseGuard<P>
where
    P: PinDriver,
{
    /// Takes charge of `driver` until the guard is dropped.
    pub const fn new(driver: P) -> Self {
        Self { driver }
    }
}

impl<P> Deref for PinReleaseGuard<P>
where
    P: PinDriver,
{
    type Target = P;

    fn deref(&self) -> &Self::Target {
        &self.driver
    }
}

impl<P> DerefMut for PinReleaseGuard<P>
where
    P: PinDriver,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.driver
    }
}

impl<P> Drop for PinReleaseGuard<P>
where
    P: PinDriver,
{
    fn drop(&mut self) {
        match self.driver.release_all() {
            Ok(()) => debug!(target: HARDWARE_TARGET, "pins released"),
            Err(error) => warn!(
                target: HARDWARE_TARGET,
                error = %error,
                "failed to release pins"
            ),
        }
    }
}
