//! Authentication module for Bybit API.
//!
//! This module provides:
//! - Credential management with secure secret storage
//! - HMAC-SHA256 signatures for query-signed GET and body-signed POST requests

mod credentials;
mod signature;

pub use credentials::{Credentials, CredentialsProvider, EnvCredentials, StaticCredentials};
pub use signature::{
    DEFAULT_RECV_WINDOW, SIGN_TYPE, SignedHeaders, canonical_query_string, sign_body, sign_query,
};
