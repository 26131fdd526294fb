//! Per-agent token-bucket rate limiter. The wait to acquire a token is
//! cancellable so a turn can unwind promptly when the conversation is
//! cancelled mid-wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A classic token bucket: `rate` tokens/second replenished continuously,
/// capped at `burst`. `acquire` blocks until one token is available or the
/// shared cancel flag is set.
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    tokens: Mutex<f64>,
    last_refill: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            rate,
            burst: burst as f64,
            tokens: Mutex::new(burst as f64),
            last_refill: Mutex::new(Instant::now()),
        }
    }

    fn refill(&self) {
        let mut last = self.last_refill.lock().expect("limiter mutex poisoned");
        let elapsed = last.elapsed().as_secs_f64();
        if elapsed <= 0.0 {
            return;
        }
        let mut tokens = self.tokens.lock().expect("limiter mutex poisoned");
        *tokens = (*tokens + elapsed * self.rate).min(self.burst);
        *last = Instant::now();
    }

    fn try_consume(&self) -> bool {
        self.refill();
        let mut tokens = self.tokens.lock().expect("limiter mutex poisoned");
        if *tokens >= 1.0 {
            *tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Waits until a token is available, polling on a short interval.
    /// Returns early (without consuming a token) if `cancel` is set.
    pub async fn acquire(&self, cancel: &AtomicBool) {
        const POLL_INTERVAL: Duration = Duration::from_millis(25);
        while !self.try_consume() {
            if cancel.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_succeeds_immediately_within_burst() {
        let limiter = RateLimiter::new(1.0, 3);
        let cancel = AtomicBool::new(false);
        for _ in 0..3 {
            limiter.acquire(&cancel).await;
        }
    }

    #[tokio::test]
    async fn acquire_returns_early_when_cancelled() {
        let limiter = RateLimiter::new(0.01, 1);
        let cancel = AtomicBool::new(false);
        limiter.acquire(&cancel).await; // drains the single burst token

        cancel.store(true, Ordering::SeqCst);
        let start = Instant::now();
        limiter.acquire(&cancel).await;
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
