//! HMAC-SHA256 signature generation for Bybit v5 authentication.
//!
//! GET requests are signed over the concatenation:
//! ```text
//! timestamp + api_key + recv_window + query_string
//! ```
//! and the hex digest travels in the `X-BAPI-SIGN` header.
//!
//! POST requests carry `timestamp`, `recv_window` and `api_key` inside the JSON
//! body. The body is rendered as `key=value&...` in key order, signed, and the
//! digest is added back to the body as `sign`.

use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::auth::Credentials;
use crate::error::BybitError;

type HmacSha256 = Hmac<Sha256>;

/// Receive window used when the client is not configured otherwise.
pub const DEFAULT_RECV_WINDOW: u64 = 25_000;

/// Value of the `X-BAPI-SIGN-TYPE` header (HMAC).
pub const SIGN_TYPE: &str = "2";

/// Header values for a signed GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub api_key: String,
    pub sign: String,
    pub timestamp: String,
    pub recv_window: String,
}

impl SignedHeaders {
    pub const API_KEY: &'static str = "X-BAPI-API-KEY";
    pub const SIGN: &'static str = "X-BAPI-SIGN";
    pub const SIGN_TYPE: &'static str = "X-BAPI-SIGN-TYPE";
    pub const TIMESTAMP: &'static str = "X-BAPI-TIMESTAMP";
    pub const RECV_WINDOW: &'static str = "X-BAPI-RECV-WINDOW";

    /// Sign `query_string` and collect the header values.
    pub fn new(
        credentials: &Credentials,
        timestamp_ms: u64,
        recv_window_ms: u64,
        query_string: &str,
    ) -> Result<Self, BybitError> {
        Ok(Self {
            api_key: credentials.api_key.clone(),
            sign: sign_query(credentials, timestamp_ms, recv_window_ms, query_string)?,
            timestamp: timestamp_ms.to_string(),
            recv_window: recv_window_ms.to_string(),
        })
    }

    /// Header name/value pairs in the order they are sent.
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            (Self::API_KEY, self.api_key.as_str()),
            (Self::SIGN, self.sign.as_str()),
            (Self::SIGN_TYPE, SIGN_TYPE),
            (Self::TIMESTAMP, self.timestamp.as_str()),
            (Self::RECV_WINDOW, self.recv_window.as_str()),
        ]
    }
}

/// Sign a GET query string.
///
/// `query_string` is the part of the target after `?`, empty when there are
/// no parameters.
///
/// # Example
///
/// ```rust
/// use bybit_api_client::auth::{Credentials, sign_query};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::new("api_key", "api_secret");
/// let signature = sign_query(&credentials, 1658384314791, 5000, "category=linear")?;
/// assert_eq!(signature.len(), 64);
/// # Ok(())
/// # }
/// ```
pub fn sign_query(
    credentials: &Credentials,
    timestamp_ms: u64,
    recv_window_ms: u64,
    query_string: &str,
) -> Result<String, BybitError> {
    let payload = format!(
        "{timestamp_ms}{}{recv_window_ms}{query_string}",
        credentials.api_key
    );
    hmac_hex(credentials.expose_secret(), &payload)
}

/// Inject authentication fields into a POST body and sign it.
///
/// Returns the body with `timestamp`, `recv_window`, `api_key` and `sign` set.
pub fn sign_body(
    credentials: &Credentials,
    timestamp_ms: u64,
    recv_window_ms: u64,
    mut body: Map<String, Value>,
) -> Result<Map<String, Value>, BybitError> {
    body.insert("timestamp".to_string(), Value::from(timestamp_ms));
    body.insert("recv_window".to_string(), Value::from(recv_window_ms));
    body.insert(
        "api_key".to_string(),
        Value::String(credentials.api_key.clone()),
    );

    let sign = hmac_hex(credentials.expose_secret(), &canonical_query_string(&body))?;
    body.insert("sign".to_string(), Value::String(sign));
    Ok(body)
}

/// Render a JSON object as `key=value&...` in ascending key order.
///
/// Strings are written without quotes, everything else as compact JSON.
pub fn canonical_query_string(body: &Map<String, Value>) -> String {
    let mut entries: Vec<_> = body.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{key}={s}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn hmac_hex(secret: &str, payload: &str) -> Result<String, BybitError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BybitError::Auth(format!("Invalid HMAC key: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
