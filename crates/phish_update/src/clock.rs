use async_trait::async_trait;
use std::time::Duration;

/// Abstracts `tokio::time::sleep` so the scheduler can be driven by
/// tests under a paused, virtually-advanced clock without real waits.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// The production clock: a thin wrapper over `tokio::time::sleep`.
/// Under a runtime started with `tokio::time::pause()`, this clock's
/// sleeps are driven by `tokio::time::advance` rather than wall time,
/// which is how scheduler tests exercise "virtual time" without a
/// bespoke clock implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

#[async_trait]
impl Clock for RealClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
