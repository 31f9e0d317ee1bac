use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Fixed minimum spacing between registry requests.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    next_slot: Option<Instant>,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until the previously scheduled slot, then books the next one.
    pub async fn wait(&mut self) {
        if self.min_interval.is_zero() {
            return;
        }
        if let Some(slot) = self.next_slot {
            let now = Instant::now();
            if slot > now {
                sleep(slot - now).await;
            }
        }
        self.next_slot = Some(Instant::now() + self.min_interval);
    }
}
