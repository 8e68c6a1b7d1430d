//! Production environment on the tokio clock.

use std::time::Duration;

use carelink_core::env::Environment;

/// Environment backed by the tokio clock.
///
/// Respects `tokio::time::pause`, so runtime tests drive timers
/// deterministically with the same code that runs in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioEnv;

impl TokioEnv {
    /// Create the environment.
    pub fn new() -> Self {
        Self
    }
}

impl Environment for TokioEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
