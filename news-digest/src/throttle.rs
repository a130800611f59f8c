use crate::traits::Throttle;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Sleeps a fixed delay before every turn except the first.
///
/// The wait does not account for how long the previous call took.
pub struct FixedDelay {
    delay: Duration,
    first_turn_taken: bool,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            first_turn_taken: false,
        }
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn wait_turn(&mut self) {
        if !self.first_turn_taken {
            self.first_turn_taken = true;
            return;
        }
        if !self.delay.is_zero() {
            debug!("Waiting {:?} before next summarization call", self.delay);
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Never waits.
pub struct NoThrottle;

#[async_trait]
impl Throttle for NoThrottle {
    async fn wait_turn(&mut self) {}
}
