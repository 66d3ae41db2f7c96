use std::future::Future;

use chrono::Utc;
use tokio::time::Duration;

/// Wall-clock time and the inter-cycle delay.
///
/// Injected into the transmitter so cycle timing can be tested without real
/// sleeps.
pub trait Clock {
    /// Seconds since the Unix epoch.
    fn unix_timestamp(&self) -> i64;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }
}
