//! Common types used across the Bybit client library.

pub mod common;
pub mod serde_helpers;

pub use common::*;
