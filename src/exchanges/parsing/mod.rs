//! JSON parsers for exchange messages
//!
//! Messages are decoded into strongly typed structures at the boundary.
//! Anything that claims to be a trade but does not decode is a `ParseError`.

pub mod binance;

pub use binance::{BinanceMessage, BinanceMessageType, BinanceParser};

use serde::{Deserialize, Deserializer};

/// Errors produced while decoding a feed message
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("message has neither an event type nor a result")]
    UnrecognizedShape,
    #[error("malformed trade: {0}")]
    MalformedTrade(String),
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Deserialize a decimal sent either as a JSON string or a JSON number
pub fn de_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Text(String),
        Number(f64),
    }

    match Decimal::deserialize(deserializer)? {
        Decimal::Number(value) => Ok(value),
        Decimal::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid decimal {text:?}: {e}"))),
    }
}
