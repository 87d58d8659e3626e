use async_trait::async_trait;
use rand::{thread_rng, Rng};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Pause inserted between page fetches
#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self);
}

/// Sleeps for a uniformly random duration within `[min_ms, max_ms]`
pub struct JitterDelay {
    min_ms: u64,
    max_ms: u64,
}

impl JitterDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    fn pick(&self) -> u64 {
        thread_rng().gen_range(self.min_ms..=self.max_ms)
    }
}

#[async_trait]
impl Delay for JitterDelay {
    async fn wait(&self) {
        let pause_ms = self.pick();
        debug!("Politeness pause {} ms", pause_ms);
        sleep(Duration::from_millis(pause_ms)).await;
    }
}

/// No pause at all
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self) {}
}
