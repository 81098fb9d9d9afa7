//! Sliding window request counter.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// A sliding window rate limiter.
///
/// Tracks request timestamps within a trailing window and enforces a maximum
/// number of requests within that window. Time is passed in by the caller.
#[derive(Debug)]
pub struct SlidingWindow {
    requests: VecDeque<Instant>,
    window: Duration,
    max_requests: u32,
}

impl SlidingWindow {
    /// Create a new sliding window rate limiter.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            requests: VecDeque::with_capacity(max_requests as usize),
            window,
            max_requests: max_requests.max(1),
        }
    }

    /// Try to record a request at `now`.
    ///
    /// Returns `Err(wait_time)` with the time until the oldest request leaves
    /// the window when the window is full. Nothing is recorded in that case.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        self.evict(now);

        if (self.requests.len() as u32) < self.max_requests {
            self.requests.push_back(now);
            Ok(())
        } else {
            let wait_time = self
                .requests
                .front()
                .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or_default();
            Err(wait_time)
        }
    }

    /// Number of requests that could still be made at `now`.
    pub fn remaining(&mut self, now: Instant) -> u32 {
        self.evict(now);
        self.max_requests.saturating_sub(self.requests.len() as u32)
    }

    /// Maximum requests per window.
    pub fn capacity(&self) -> u32 {
        self.max_requests
    }

    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.requests.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }
}
