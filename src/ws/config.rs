//! WebSocket connection settings.

use std::time::Duration;

/// WebSocket endpoint URLs.
pub mod endpoints {
    /// Public USDT/USDC contracts stream.
    pub const WS_PUBLIC_LINEAR: &str = "wss://stream.bybit.com/v5/public/linear";
    /// Public spot stream.
    pub const WS_PUBLIC_SPOT: &str = "wss://stream.bybit.com/v5/public/spot";
    /// Public inverse contracts stream.
    pub const WS_PUBLIC_INVERSE: &str = "wss://stream.bybit.com/v5/public/inverse";
    /// Public linear stream on testnet.
    pub const WS_TESTNET_PUBLIC_LINEAR: &str = "wss://stream-testnet.bybit.com/v5/public/linear";
}

/// Configuration for a WebSocket session.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Endpoint to connect to, `wss://` or `ws://`.
    pub url: String,
    /// Deadline for each connection phase (resolve, connect, TLS, handshake).
    pub connect_timeout: Duration,
    /// Interval between ping frames once streaming.
    pub ping_interval: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: endpoints::WS_PUBLIC_LINEAR.to_string(),
            connect_timeout: Duration::from_secs(30),
            ping_interval: Duration::from_secs(20),
        }
    }
}

impl WsConfig {
    /// Create a new configuration builder.
    pub fn builder() -> WsConfigBuilder {
        WsConfigBuilder::new()
    }
}

/// Builder for [`WsConfig`].
#[derive(Debug, Clone, Default)]
pub struct WsConfigBuilder {
    config: WsConfig,
}

impl WsConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: WsConfig::default(),
        }
    }

    /// Set the endpoint URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Set the deadline of each connection phase.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set ping interval.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> WsConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WsConfig::default();
        assert_eq!(config.url, endpoints::WS_PUBLIC_LINEAR);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.ping_interval, Duration::from_secs(20));
    }

    #[test]
    fn test_builder() {
        let config = WsConfig::builder()
            .url("ws://127.0.0.1:9000")
            .ping_interval(Duration::from_millis(500))
            .build();
        assert_eq!(config.url, "ws://127.0.0.1:9000");
        assert_eq!(config.ping_interval, Duration::from_millis(500));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }
}
