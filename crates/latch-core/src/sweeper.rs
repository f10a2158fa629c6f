//! Expiry sweeper - background task that reaps expired locks
//!
//! Runs on a fixed period, independent of request traffic, and invokes one
//! registry-wide expiry pass per tick. Timeout detection latency is bounded
//! by the sweep period, not by exact deadline firing.

use std::time::Duration;

use tracing::info;

use crate::registry::LockEngine;

/// Background task driving [`LockEngine::sweep`] on a fixed period.
pub struct Sweeper {
    engine: LockEngine,
    period: Duration,
}

impl Sweeper {
    pub fn new(engine: LockEngine, period: Duration) -> Self {
        Self { engine, period }
    }

    /// Start the sweep loop (runs forever). The tick takes the same
    /// exclusion domain as every mutating request, so it interleaves
    /// arbitrarily and safely with acquires, releases, and deletions.
    pub async fn run(self) {
        info!(period_secs = self.period.as_secs_f64(), "expiry sweeper started");
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            self.engine.sweep();
        }
    }
}
