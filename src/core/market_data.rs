//! Market data types
//!
//! PriceTick is the validated form of a single `@trade` stream event.
//! Decimal fields are accepted as JSON strings or numbers.

use crate::exchanges::parsing::{de_decimal, ParseError};
use serde::Deserialize;

/// One trade observation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriceTick {
    /// Event type, `trade`
    #[serde(rename = "e")]
    pub event_type: String,
    /// Event time (milliseconds since epoch)
    #[serde(rename = "E")]
    pub event_time: u64,
    /// Exchange symbol, upper-case
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: u64,
    #[serde(rename = "p", deserialize_with = "de_decimal")]
    pub price: f64,
    #[serde(rename = "q", deserialize_with = "de_decimal")]
    pub quantity: f64,
    /// Buyer order id (no longer sent on every stream)
    #[serde(rename = "b", default)]
    pub buyer_order_id: Option<u64>,
    /// Seller order id (no longer sent on every stream)
    #[serde(rename = "a", default)]
    pub seller_order_id: Option<u64>,
    /// Trade time (milliseconds since epoch)
    #[serde(rename = "T")]
    pub trade_time: u64,
    /// Is the buyer the market maker
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

impl PriceTick {
    /// Reject values that deserialize fine but cannot feed the EMA
    pub fn validate(self) -> Result<Self, ParseError> {
        if self.symbol.is_empty() {
            return Err(ParseError::InvalidField {
                field: "s",
                reason: "empty symbol".to_string(),
            });
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ParseError::InvalidField {
                field: "p",
                reason: format!("price must be finite and positive, got {}", self.price),
            });
        }
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(ParseError::InvalidField {
                field: "q",
                reason: format!("quantity must be finite and non-negative, got {}", self.quantity),
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::trade_tick;

    #[test]
    fn test_deserialize_string_decimals() {
        let json = r#"{"e":"trade","E":1672515782136,"s":"SOLBTC","t":12345,"p":"0.00105","q":"12.5","b":88,"a":50,"T":1672515782136,"m":true,"M":true}"#;
        let tick: PriceTick = serde_json::from_str(json).unwrap();
        assert_eq!(tick.symbol, "SOLBTC");
        assert_eq!(tick.event_time, 1672515782136);
        assert_eq!(tick.price, 0.00105);
        assert_eq!(tick.quantity, 12.5);
        assert_eq!(tick.buyer_order_id, Some(88));
        assert!(tick.is_buyer_maker);
    }

    #[test]
    fn test_deserialize_numeric_decimals_without_order_ids() {
        let json = r#"{"e":"trade","E":1,"s":"SOLUSDT","t":2,"p":101.5,"q":3,"T":1,"m":false,"M":true}"#;
        let tick: PriceTick = serde_json::from_str(json).unwrap();
        assert_eq!(tick.price, 101.5);
        assert_eq!(tick.buyer_order_id, None);
        assert_eq!(tick.seller_order_id, None);
    }

    #[test]
    fn test_validate_rejects_bad_price() {
        let mut tick = trade_tick("SOLUSDT", 100.0, 1_000);
        tick.price = 0.0;
        assert!(matches!(
            tick.validate(),
            Err(ParseError::InvalidField { field: "p", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_quantity() {
        let mut tick = trade_tick("SOLUSDT", 100.0, 1_000);
        tick.quantity = -1.0;
        assert!(tick.validate().is_err());
    }
}
