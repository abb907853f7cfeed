//! Injectable latency for simulated work.

use std::time::Duration;

use async_trait::async_trait;

/// Suspends for a simulated amount of work.
///
/// Production wiring uses [`TokioDelay`]; tests inject [`NoDelay`] so the
/// executor completes instantly.
#[async_trait]
pub trait Delay: Send + Sync + std::fmt::Debug {
    async fn delay(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn delay(&self, _duration: Duration) {}
}
