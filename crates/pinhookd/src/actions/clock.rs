//! Time source used by timed actions and loop back-off.

use std::thread;
use std::time::{Duration, Instant};

/// Reads the time and sleeps.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<C> Clock for &C
where
    C: Clock + ?Sized,
{
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Wall clock backed by [`Instant::now`] and [`thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
