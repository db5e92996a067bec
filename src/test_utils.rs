//! Test fixtures shared across modules

use crate::core::{PairRegistry, PriceTick};

/// SOL against BTC, ETH and USDT, settled in USDT.
///
/// Targets: `SOLBTC`, `SOLETH`, `SOLUSDT`. Bridges: `BTCUSDT`, `ETHUSDT`.
pub fn sol_registry() -> PairRegistry {
    PairRegistry::for_base("SOL", "USDT", ["BTC", "ETH", "USDT"])
        .expect("SOL test registry is valid")
}

/// Valid trade tick with quantity 1
pub fn trade_tick(symbol: &str, price: f64, event_time: u64) -> PriceTick {
    PriceTick {
        event_type: "trade".to_string(),
        event_time,
        symbol: symbol.to_string(),
        trade_id: event_time,
        price,
        quantity: 1.0,
        buyer_order_id: None,
        seller_order_id: None,
        trade_time: event_time,
        is_buyer_maker: false,
    }
}

/// Raw `@trade` frame as sent by the exchange
pub fn trade_frame(symbol: &str, price: &str, event_time: u64) -> Vec<u8> {
    format!(
        r#"{{"e":"trade","E":{t},"s":"{s}","t":{t},"p":"{p}","q":"1.0","T":{t},"m":false,"M":true}}"#,
        t = event_time,
        s = symbol,
        p = price,
    )
    .into_bytes()
}
