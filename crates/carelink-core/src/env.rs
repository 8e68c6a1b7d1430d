//! Environment abstraction for deterministic testing.
//!
//! Decouples session logic from system time. Production drivers run on the
//! tokio clock; tests use a manually advanced clock so timer behavior
//! (heartbeat cadence, reconnect delays, ring timeouts) is exact.

use std::time::Duration;

/// Abstract environment providing monotonic time and sleeping.
///
/// State machines never call this directly; they take `now` as a method
/// parameter. Only driver code holds an `Environment`, which is what lets the
/// same orchestration run against real time and virtual time.
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use the tokio clock's instant; tests use
    /// `std::time::Instant` behind a manual offset.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time.
    ///
    /// # Invariants
    ///
    /// Must be monotonic: subsequent calls within one execution context
    /// return instants greater than or equal to earlier calls.
    fn now(&self) -> Self::Instant;

    /// Sleep for the given duration.
    ///
    /// This is the only async member, and only driver code awaits it.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

pub mod test_utils {
    //! Deterministic environments for tests.

    use std::{
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    };

    use super::Environment;

    /// Environment with a manually advanced clock and no-op sleeps.
    ///
    /// Clones share the same clock, so a test can hold one handle to advance
    /// time while the code under test reads it.
    #[derive(Debug, Clone)]
    pub struct MockEnv {
        start: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl MockEnv {
        /// Create a clock pinned at an arbitrary starting instant.
        pub fn new() -> Self {
            Self { start: Instant::now(), offset: Arc::new(Mutex::new(Duration::ZERO)) }
        }

        /// Advance the clock by `delta`.
        pub fn advance(&self, delta: Duration) {
            if let Ok(mut offset) = self.offset.lock() {
                *offset += delta;
            }
        }
    }

    impl Default for MockEnv {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Environment for MockEnv {
        type Instant = Instant;

        fn now(&self) -> Instant {
            let offset = self.offset.lock().map(|guard| *guard).unwrap_or_default();
            self.start + offset
        }

        fn sleep(&self, _duration: Duration) -> impl std::future::Future<Output = ()> + Send {
            std::future::ready(())
        }
    }

}
