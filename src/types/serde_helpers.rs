//! Custom serde helpers for Bybit's serialization quirks.
//!
//! Bybit v5 encodes almost every number as a JSON string, uses `""` for
//! fields that do not apply, and occasionally switches between string and
//! number encodings for the same field across endpoints.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, de};

/// Deserialize a decimal string, treating `""` and `null` as zero.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use rust_decimal::Decimal;
/// use bybit_api_client::types::serde_helpers::decimal_or_zero;
///
/// #[derive(Deserialize, Debug)]
/// struct Position {
///     #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
///     avg_price: Decimal,
/// }
///
/// let position: Position = serde_json::from_str(r#"{"avg_price":""}"#).unwrap();
/// assert!(position.avg_price.is_zero());
///
/// let position: Position = serde_json::from_str(r#"{"avg_price":"27150.5"}"#).unwrap();
/// assert_eq!(position.avg_price.to_string(), "27150.5");
/// ```
pub mod decimal_or_zero {
    use super::*;

    /// Deserialize a decimal that may be empty.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DecimalVisitor;

        impl<'de> de::Visitor<'de> for DecimalVisitor {
            type Value = Decimal;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a decimal string, a number, or an empty string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let v = v.trim();
                if v.is_empty() {
                    return Ok(Decimal::ZERO);
                }
                v.parse::<Decimal>()
                    .or_else(|_| Decimal::from_scientific(v))
                    .map_err(de::Error::custom)
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Decimal::from(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Decimal::from(v))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Decimal::try_from(v).map_err(de::Error::custom)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Decimal::ZERO)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Decimal::ZERO)
            }
        }

        deserializer.deserialize_any(DecimalVisitor)
    }
}

/// Deserialize an integer encoded either as a number or a string.
///
/// Empty strings and `null` become zero.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use bybit_api_client::types::serde_helpers::int_or_string;
///
/// #[derive(Deserialize, Debug)]
/// struct Entry {
///     #[serde(deserialize_with = "int_or_string::deserialize", default)]
///     ts: i64,
/// }
///
/// let a: Entry = serde_json::from_str(r#"{"ts":"1672304486865"}"#).unwrap();
/// let b: Entry = serde_json::from_str(r#"{"ts":1672304486865}"#).unwrap();
/// assert_eq!(a.ts, b.ts);
/// ```
pub mod int_or_string {
    use super::*;

    /// Deserialize an integer that may be string-encoded.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IntVisitor;

        impl<'de> de::Visitor<'de> for IntVisitor {
            type Value = i64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an integer or an integer string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let v = v.trim();
                if v.is_empty() {
                    return Ok(0);
                }
                v.parse::<i64>().map_err(de::Error::custom)
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                i64::try_from(v).map_err(de::Error::custom)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(0)
            }
        }

        deserializer.deserialize_any(IntVisitor)
    }
}

/// Deserialize a string, returning None if empty.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use bybit_api_client::types::serde_helpers::empty_string_as_none;
///
/// #[derive(Deserialize, Debug)]
/// struct Response {
///     #[serde(deserialize_with = "empty_string_as_none::deserialize", default)]
///     cursor: Option<String>,
/// }
///
/// let response: Response = serde_json::from_str(r#"{"cursor":""}"#).unwrap();
/// assert!(response.cursor.is_none());
/// ```
pub mod empty_string_as_none {
    use super::*;

    /// Deserialize a string, returning None if empty.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        Ok(s.filter(|s| !s.is_empty()))
    }
}

/// Deserialize to `None` instead of failing on invalid/unexpected data.
///
/// Used for enum fields where Bybit sends `""` when the field does not apply.
pub mod default_on_error {
    use super::*;

    /// Deserialize a value, returning None if deserialization fails.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Ok(T::deserialize(deserializer).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::str::FromStr;

    #[derive(Deserialize, Debug)]
    struct Amounts {
        #[serde(deserialize_with = "decimal_or_zero::deserialize", default)]
        value: Decimal,
        #[serde(deserialize_with = "int_or_string::deserialize", default)]
        ts: i64,
    }

    #[test]
    fn test_decimal_or_zero_string() {
        let parsed: Amounts = serde_json::from_str(r#"{"value":"0.00012"}"#).unwrap();
        assert_eq!(parsed.value, Decimal::from_str("0.00012").unwrap());
    }

    #[test]
    fn test_decimal_or_zero_empty_and_missing() {
        let parsed: Amounts = serde_json::from_str(r#"{"value":""}"#).unwrap();
        assert!(parsed.value.is_zero());

        let parsed: Amounts = serde_json::from_str(r#"{}"#).unwrap();
        assert!(parsed.value.is_zero());
        assert_eq!(parsed.ts, 0);
    }

    #[test]
    fn test_decimal_or_zero_rejects_garbage() {
        let parsed: Result<Amounts, _> = serde_json::from_str(r#"{"value":"abc"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_int_or_string_both_encodings() {
        let parsed: Amounts = serde_json::from_str(r#"{"ts":"1700000000000"}"#).unwrap();
        assert_eq!(parsed.ts, 1_700_000_000_000);

        let parsed: Amounts = serde_json::from_str(r#"{"ts":1700000000000}"#).unwrap();
        assert_eq!(parsed.ts, 1_700_000_000_000);
    }

    #[test]
    fn test_default_on_error_invalid() {
        #[derive(Deserialize)]
        struct Test {
            #[serde(deserialize_with = "default_on_error::deserialize", default)]
            value: Option<u32>,
        }

        let parsed: Test = serde_json::from_str(r#"{"value":""}"#).unwrap();
        assert!(parsed.value.is_none());
    }
}
