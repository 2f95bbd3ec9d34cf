use std::time::Duration;
use tokio::time::sleep;

/// Bandwidth cap of the transfer loop: a fixed chunk size and a pause after
/// every chunk. A zero delay turns the cap off.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Throttle {
    chunk_size: usize,
    chunk_delay: Duration,
}

impl Throttle {
    pub fn new(chunk_size: usize, chunk_delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_delay,
        }
    }

    pub fn unlimited(chunk_size: usize) -> Self {
        Self::new(chunk_size, Duration::ZERO)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_delay(&self) -> Duration {
        self.chunk_delay
    }

    pub async fn pause(&self) {
        if !self.chunk_delay.is_zero() {
            sleep(self.chunk_delay).await;
        }
    }
}
