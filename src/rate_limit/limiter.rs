//! Adaptive rate limiter shared by all REST calls of a client.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::rate_limit::SlidingWindow;
use crate::rate_limit::limits::{
    LIMIT_RESET_HEADER, LIMIT_STATUS_HEADER, LOCAL_BUFFER, LOCAL_WINDOW, SERVER_MIN_REMAINING,
    SERVER_RESET_BUFFER,
};

/// Gate invoked before every outbound REST call.
///
/// Starts in local sliding-window mode. The first response carrying both
/// limit headers switches it to server-driven mode, which is never left.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

#[derive(Debug)]
struct LimiterState {
    server_driven: bool,
    remaining: u32,
    reset_time_ms: i64,
    window: SlidingWindow,
}

impl LimiterState {
    /// Time to sleep before the next call in server-driven mode.
    fn server_delay(&self, now_ms: i64) -> Option<Duration> {
        if self.remaining <= SERVER_MIN_REMAINING && self.reset_time_ms > now_ms {
            let until_reset = Duration::from_millis((self.reset_time_ms - now_ms) as u64);
            Some(until_reset + SERVER_RESET_BUFFER)
        } else {
            None
        }
    }
}

impl RateLimiter {
    /// Create a limiter allowing `local_capacity` requests per second in local mode.
    pub fn new(local_capacity: u32) -> Self {
        Self {
            state: Mutex::new(LimiterState {
                server_driven: false,
                remaining: 0,
                reset_time_ms: 0,
                window: SlidingWindow::new(LOCAL_WINDOW, local_capacity),
            }),
        }
    }

    /// Block until the next request may be sent.
    ///
    /// The lock is held while sleeping, so concurrent callers are released
    /// one at a time.
    pub async fn wait(&self) {
        let mut state = self.state.lock().await;

        if state.server_driven {
            if let Some(delay) = state.server_delay(now_ms()) {
                tracing::debug!(
                    remaining = state.remaining,
                    reset_time_ms = state.reset_time_ms,
                    ?delay,
                    "Server rate limit nearly exhausted, waiting for reset"
                );
                tokio::time::sleep(delay).await;
            }
            return;
        }

        loop {
            match state.window.try_acquire(Instant::now()) {
                Ok(()) => return,
                Err(wait) => {
                    tracing::debug!(?wait, "Local rate limit reached, waiting");
                    tokio::time::sleep(wait + LOCAL_BUFFER).await;
                }
            }
        }
    }

    /// Record the limit headers of a response.
    ///
    /// Responses without both headers leave the limiter untouched. Headers
    /// that fail to parse are logged and ignored.
    pub async fn update(&self, headers: &HeaderMap) {
        let (Some(status), Some(reset)) = (
            headers.get(LIMIT_STATUS_HEADER),
            headers.get(LIMIT_RESET_HEADER),
        ) else {
            return;
        };

        let parsed = status
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .zip(reset.to_str().ok().and_then(|s| s.trim().parse::<i64>().ok()));

        let Some((remaining, reset_time_ms)) = parsed else {
            tracing::warn!(
                ?status,
                ?reset,
                "Failed to parse rate limit headers, ignoring"
            );
            return;
        };

        let mut state = self.state.lock().await;
        if !state.server_driven {
            tracing::debug!("Switching to server-driven rate limiting");
        }
        state.server_driven = true;
        state.remaining = remaining;
        state.reset_time_ms = reset_time_ms;
    }

    /// Whether limit headers have been observed.
    pub async fn is_server_driven(&self) -> bool {
        self.state.lock().await.server_driven
    }

    /// Last reported remaining calls, zero before server-driven mode.
    pub async fn remaining(&self) -> u32 {
        self.state.lock().await.remaining
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(super::limits::DEFAULT_LOCAL_CAPACITY)
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn limit_headers(remaining: &str, reset: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LIMIT_STATUS_HEADER, HeaderValue::from_str(remaining).unwrap());
        headers.insert(LIMIT_RESET_HEADER, HeaderValue::from_str(reset).unwrap());
        headers
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_mode_blocks_after_capacity() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.wait().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.wait().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= LOCAL_WINDOW, "waited only {elapsed:?}");
        assert!(elapsed < LOCAL_WINDOW + Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_is_pending_while_window_is_full() {
        let limiter = RateLimiter::new(1);
        limiter.wait().await;

        let mut blocked = tokio_test::task::spawn(limiter.wait());
        tokio_test::assert_pending!(blocked.poll());

        tokio::time::advance(LOCAL_WINDOW + LOCAL_BUFFER).await;
        tokio_test::assert_ready!(blocked.poll());
    }

    #[tokio::test]
    async fn test_switches_to_server_mode_on_headers() {
        let limiter = RateLimiter::new(3);
        assert!(!limiter.is_server_driven().await);

        limiter.update(&limit_headers("42", "1700000000000")).await;

        assert!(limiter.is_server_driven().await);
        assert_eq!(limiter.remaining().await, 42);
    }

    #[tokio::test]
    async fn test_single_header_is_ignored() {
        let limiter = RateLimiter::new(3);
        let mut headers = HeaderMap::new();
        headers.insert(LIMIT_STATUS_HEADER, HeaderValue::from_static("42"));

        limiter.update(&headers).await;
        assert!(!limiter.is_server_driven().await);
    }

    #[tokio::test]
    async fn test_unparsable_headers_are_ignored() {
        let limiter = RateLimiter::new(3);
        limiter.update(&limit_headers("many", "soon")).await;
        assert!(!limiter.is_server_driven().await);
    }

    #[tokio::test]
    async fn test_server_mode_never_reverts() {
        let limiter = RateLimiter::new(1);
        limiter.update(&limit_headers("50", "0")).await;

        // No headers on later responses.
        limiter.update(&HeaderMap::new()).await;
        assert!(limiter.is_server_driven().await);

        // Local capacity of one no longer applies.
        let start = std::time::Instant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_server_mode_waits_for_reset_when_exhausted() {
        let limiter = RateLimiter::new(1);
        let reset = now_ms() + 100;
        limiter.update(&limit_headers("1", &reset.to_string())).await;

        let start = std::time::Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_server_delay_ignores_past_reset() {
        let state = LimiterState {
            server_driven: true,
            remaining: 0,
            reset_time_ms: 1_000,
            window: SlidingWindow::new(LOCAL_WINDOW, 1),
        };
        assert_eq!(state.server_delay(2_000), None);
        assert_eq!(
            state.server_delay(900),
            Some(Duration::from_millis(100) + SERVER_RESET_BUFFER)
        );
    }
}
