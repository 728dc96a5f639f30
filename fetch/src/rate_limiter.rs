use std::time::Instant;

use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

/// Single-process, mutex-guarded token bucket. Capacity and refill rate are
/// both `R` tokens/second, so the bucket can never hold more than one
/// second's worth of burst.
///
/// FIFO ordering is not guaranteed between concurrent `acquire` callers;
/// starvation is bounded by the refill rate.
pub struct RateLimiter {
    state: Mutex<BucketState>,
    rate: f64,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// `rate` is both the bucket capacity and the refill rate, in
    /// tokens/second. Defaults to 5 when built via
    /// [`RateLimiter::default_rate`].
    pub fn new(rate: f64) -> Self {
        Self {
            state: Mutex::new(BucketState {
                tokens: rate,
                last_refill: Instant::now(),
            }),
            rate,
        }
    }

    pub fn default_rate() -> Self {
        Self::new(5.0)
    }

    /// Blocks until at least one token is available, then consumes it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(state.last_refill).as_secs_f64();
                state.tokens = (state.tokens + elapsed * self.rate).min(self.rate);
                state.last_refill = now;

                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64((1.0 - state.tokens) / self.rate))
                }
            };

            match wait {
                None => return,
                Some(wait) => sleep(wait).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant as StdInstant;

    #[tokio::test]
    async fn ten_requests_at_five_per_second_take_at_least_1_8s() {
        let limiter = RateLimiter::new(5.0);
        let start = StdInstant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(1800),
            "expected >= 1.8s, got {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn a_single_acquire_does_not_block() {
        let limiter = RateLimiter::new(5.0);
        let start = StdInstant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
