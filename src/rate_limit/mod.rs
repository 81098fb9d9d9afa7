//! Rate limiting for Bybit API.
//!
//! Every REST call passes through a single [`RateLimiter`]:
//!
//! - Until the exchange reports its limits, requests are throttled locally by
//!   a one second [`SlidingWindow`].
//! - Once a response carries both `X-Bapi-Limit-Status` and
//!   `X-Bapi-Limit-Reset-Timestamp`, the limiter switches to server-driven mode
//!   for the rest of its life and only sleeps when the reported budget is
//!   nearly exhausted.
//!
//! Requests are never dropped, callers simply wait.
//!
//! ## Example
//!
//! ```rust
//! use bybit_api_client::rate_limit::RateLimiter;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limiter = RateLimiter::new(10);
//! limiter.wait().await;
//! assert!(!limiter.is_server_driven().await);
//! # }
//! ```

mod limiter;
mod sliding_window;

pub use limiter::RateLimiter;
pub use sliding_window::SlidingWindow;

/// Rate limit constants.
pub mod limits {
    use std::time::Duration;

    /// Requests per window allowed in local mode.
    pub const DEFAULT_LOCAL_CAPACITY: u32 = 10;
    /// Local sliding window length.
    pub const LOCAL_WINDOW: Duration = Duration::from_millis(1000);
    /// Added to the local wait so the oldest entry has expired on wake.
    pub const LOCAL_BUFFER: Duration = Duration::from_millis(10);
    /// Server mode starts sleeping at or below this many remaining calls.
    pub const SERVER_MIN_REMAINING: u32 = 2;
    /// Added to the reported reset time before waking.
    pub const SERVER_RESET_BUFFER: Duration = Duration::from_millis(50);

    /// Remaining calls in the current server window.
    pub const LIMIT_STATUS_HEADER: &str = "x-bapi-limit-status";
    /// Epoch milliseconds at which the server window resets.
    pub const LIMIT_RESET_HEADER: &str = "x-bapi-limit-reset-timestamp";
}
