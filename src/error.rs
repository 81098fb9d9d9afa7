//! Error types for the Bybit client library.

use thiserror::Error;

/// The main error type for all Bybit client operations.
#[derive(Error, Debug)]
pub enum BybitError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// WebSocket communication error (with message)
    #[error("WebSocket error: {0}")]
    WebSocketMsg(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Socket level I/O error (resolve, connect, read, write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS setup or handshake failed
    #[error("TLS error: {0}")]
    Tls(String),

    /// Bybit API returned a non-zero `retCode`
    #[error("Bybit API error: {0}")]
    Api(ApiError),

    /// HTTP status outside of the 2xx range
    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        /// Status code returned by the server
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Caller supplied arguments the API cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Connection phase timed out
    #[error("Request timed out")]
    Timeout,

    /// Missing required credentials
    #[error("Missing credentials: API key and secret required for private endpoints")]
    MissingCredentials,
}

/// Business error carried in the v5 response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The `retCode` field, never zero
    pub code: i64,
    /// The `retMsg` field
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl ApiError {
    /// Create a new API error from code and message.
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        self.code == error_codes::TOO_MANY_VISITS
    }

    /// Check if the request was rejected for its key, signature or permissions.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self.code,
            error_codes::INVALID_API_KEY
                | error_codes::INVALID_SIGNATURE
                | error_codes::PERMISSION_DENIED
        )
    }

    /// Check if the timestamp fell outside of the receive window.
    pub fn is_recv_window_error(&self) -> bool {
        self.code == error_codes::TIMESTAMP_OUT_OF_WINDOW
    }

    /// Check if a position mode switch was a no-op.
    pub fn is_position_mode_not_modified(&self) -> bool {
        self.code == error_codes::POSITION_MODE_NOT_MODIFIED
            || self.message == error_codes::POSITION_MODE_NOT_MODIFIED_MSG
    }
}

/// Known Bybit v5 `retCode` values.
pub mod error_codes {
    pub const PARAMS_ERROR: i64 = 10001;
    pub const TIMESTAMP_OUT_OF_WINDOW: i64 = 10002;
    pub const INVALID_API_KEY: i64 = 10003;
    pub const INVALID_SIGNATURE: i64 = 10004;
    pub const PERMISSION_DENIED: i64 = 10005;
    pub const TOO_MANY_VISITS: i64 = 10006;
    pub const ORDER_NOT_EXISTS: i64 = 110001;
    pub const POSITION_MODE_NOT_MODIFIED: i64 = 110025;

    pub const POSITION_MODE_NOT_MODIFIED_MSG: &str = "Position mode is not modified";
}
