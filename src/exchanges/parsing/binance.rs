//! Binance spot message parser
//!
//! Parses `<symbol>@trade` stream events and the control responses that share
//! the same socket (subscription acks, error replies).

use super::ParseError;
use crate::core::PriceTick;
use serde::Deserialize;
use serde_json::Value;

/// Binance message parser
pub struct BinanceParser;

impl BinanceParser {
    /// Parse one text frame.
    ///
    /// Binance trade format:
    /// {
    ///   "e": "trade",
    ///   "E": 1672515782136,
    ///   "s": "BNBBTC",
    ///   "t": 12345,
    ///   "p": "0.001",
    ///   "q": "100",
    ///   "T": 1672515782136,
    ///   "m": true,
    ///   "M": true
    /// }
    pub fn parse(data: &[u8]) -> Result<BinanceMessage, ParseError> {
        let value: Value =
            serde_json::from_slice(data).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        match Self::detect_message_type(&value) {
            BinanceMessageType::Trade => {
                let tick: PriceTick = serde_json::from_value(value)
                    .map_err(|e| ParseError::MalformedTrade(e.to_string()))?;
                Ok(BinanceMessage::Trade(tick.validate()?))
            }
            BinanceMessageType::SubscriptionResponse => Ok(BinanceMessage::SubscriptionResponse {
                id: value.get("id").and_then(Value::as_u64),
            }),
            BinanceMessageType::ErrorResponse => {
                let reply: ErrorReply = serde_json::from_value(value)
                    .map_err(|e| ParseError::InvalidJson(e.to_string()))?;
                Ok(BinanceMessage::ErrorResponse {
                    id: reply.id,
                    code: reply.error.code,
                    msg: reply.error.msg,
                })
            }
            BinanceMessageType::OtherEvent => {
                let event = value
                    .get("e")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(BinanceMessage::OtherEvent(event))
            }
            BinanceMessageType::NotAnObject => Err(ParseError::NotAnObject),
            BinanceMessageType::Unknown => Err(ParseError::UnrecognizedShape),
        }
    }

    /// Classify a decoded message without deserializing its payload
    pub fn detect_message_type(value: &Value) -> BinanceMessageType {
        let Some(object) = value.as_object() else {
            return BinanceMessageType::NotAnObject;
        };

        match object.get("e") {
            Some(Value::String(event)) if event == "trade" => BinanceMessageType::Trade,
            Some(Value::String(_)) => BinanceMessageType::OtherEvent,
            // Present but not a string: the trade decode reports the type error
            Some(_) => BinanceMessageType::Trade,
            None if object.contains_key("result") => BinanceMessageType::SubscriptionResponse,
            None if object.contains_key("error") => BinanceMessageType::ErrorResponse,
            None => BinanceMessageType::Unknown,
        }
    }
}

/// Binance message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinanceMessageType {
    Trade,
    OtherEvent,
    SubscriptionResponse,
    ErrorResponse,
    NotAnObject,
    Unknown,
}

/// Decoded Binance message
#[derive(Debug, Clone, PartialEq)]
pub enum BinanceMessage {
    Trade(PriceTick),
    /// `{"result": null, "id": n}` and other command replies
    SubscriptionResponse { id: Option<u64> },
    /// `{"error": {"code": c, "msg": m}, "id": n}`
    ErrorResponse { id: Option<u64>, code: i64, msg: String },
    /// Event of a stream we do not consume
    OtherEvent(String),
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    id: Option<u64>,
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    msg: String,
}
