//! Pair discovery and volume weights (Cold Path)
//!
//! Fetches the target pairs of a base asset from exchange metadata and the
//! trailing 24h volume used to weight each pair in the composite.
//! Called once at startup - NOT in hot path.

use crate::core::{PairRegistry, TradingPair};
use crate::exchanges::parsing::de_decimal;
use crate::hot_path::VolumeWeights;
use crate::infrastructure::config::FeedConfig;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Binance spot REST base URL
pub const REST_URL: &str = "https://api.binance.com/api/v3";

/// Discovery client
pub struct PairDiscovery {
    client: reqwest::Client,
    rest_url: String,
}

impl PairDiscovery {
    pub fn new(config: &FeedConfig) -> Result<Self, DiscoveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent("composite-price/0.1")
            .build()
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;
        Ok(Self {
            client,
            rest_url: config.rest_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch all tradable pairs of `base`
    ///
    /// API: GET {rest_url}/exchangeInfo
    pub async fn fetch_target_pairs(
        &self,
        base: &str,
        settlement: &str,
        include_settlement_pair: bool,
    ) -> Result<Vec<TradingPair>, DiscoveryError> {
        let url = format!("{}/exchangeInfo", self.rest_url);
        tracing::info!("Fetching exchange info from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Http(response.status().as_u16()));
        }

        let info: ExchangeInfo = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Parse(e.to_string()))?;

        tracing::info!("Received {} symbols", info.symbols.len());
        select_target_pairs(&info, base, settlement, include_settlement_pair)
    }

    /// 24h ticker of one symbol; `None` if the exchange does not list it
    ///
    /// API: GET {rest_url}/ticker/24hr?symbol=X
    pub async fn fetch_ticker(&self, symbol: &str) -> Result<Option<Ticker24h>, DiscoveryError> {
        let url = format!("{}/ticker/24hr", self.rest_url);
        let response = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| DiscoveryError::Network(e.to_string()))?;

        // Unknown symbols come back as 400 {"code":-1121,...}
        if response.status() == StatusCode::BAD_REQUEST {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DiscoveryError::Http(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| DiscoveryError::Parse(e.to_string()))
    }

    /// Settlement-denominated 24h volume of every target pair.
    ///
    /// Pairs whose quote has no settlement rate are skipped with a warning.
    pub async fn fetch_volume_weights(
        &self,
        registry: &PairRegistry,
    ) -> Result<VolumeWeights, DiscoveryError> {
        let settlement = registry.settlement();
        let mut rates: HashMap<String, Option<f64>> = HashMap::new();
        let mut weights = VolumeWeights::new();

        for target in registry.targets() {
            let quote = target.pair.quote();
            let rate = match rates.get(quote) {
                Some(rate) => *rate,
                None => {
                    let rate = self.fetch_settlement_rate(quote, settlement).await?;
                    rates.insert(quote.to_string(), rate);
                    rate
                }
            };

            let Some(rate) = rate else {
                tracing::warn!("No {} rate for {}, skipping {}", settlement, quote, target.symbol);
                continue;
            };

            let Some(ticker) = self.fetch_ticker(&target.symbol).await? else {
                tracing::warn!("No 24h ticker for {}, skipping", target.symbol);
                continue;
            };

            let weight = settlement_volume(&ticker, rate);
            weights
                .insert(target.symbol.clone(), weight)
                .map_err(|e| DiscoveryError::Parse(e.to_string()))?;
            tracing::info!("{} weight: {:.2} {}", target.symbol, weight, settlement);
        }

        if weights.is_empty() {
            return Err(DiscoveryError::NoPairs(registry.base().to_string()));
        }
        Ok(weights)
    }

    async fn fetch_settlement_rate(
        &self,
        quote: &str,
        settlement: &str,
    ) -> Result<Option<f64>, DiscoveryError> {
        if quote == settlement {
            return Ok(Some(1.0));
        }
        let direct = self.fetch_ticker(&format!("{}{}", quote, settlement)).await?;
        let inverse = match direct {
            Some(_) => None,
            None => self.fetch_ticker(&format!("{}{}", settlement, quote)).await?,
        };
        Ok(settlement_rate(direct.as_ref(), inverse.as_ref()))
    }
}

/// Keep `TRADING` symbols whose base asset is `base`
pub fn select_target_pairs(
    info: &ExchangeInfo,
    base: &str,
    settlement: &str,
    include_settlement_pair: bool,
) -> Result<Vec<TradingPair>, DiscoveryError> {
    let base = base.to_ascii_uppercase();
    let settlement = settlement.to_ascii_uppercase();

    let pairs: Vec<TradingPair> = info
        .symbols
        .iter()
        .filter(|s| s.status == "TRADING")
        .filter(|s| s.base_asset == base)
        .filter(|s| include_settlement_pair || s.quote_asset != settlement)
        .filter_map(|s| TradingPair::new(&s.base_asset, &s.quote_asset).ok())
        .collect();

    if pairs.is_empty() {
        return Err(DiscoveryError::NoPairs(base));
    }
    tracing::info!("Discovered {} pairs for {}", pairs.len(), base);
    Ok(pairs)
}

/// Price of one quote unit in settlement units.
///
/// `QUOTE/SETTLEMENT` weighted average price if listed, otherwise the inverse
/// of `SETTLEMENT/QUOTE`.
pub fn settlement_rate(direct: Option<&Ticker24h>, inverse: Option<&Ticker24h>) -> Option<f64> {
    if let Some(ticker) = direct {
        if ticker.weighted_avg_price > 0.0 {
            return Some(ticker.weighted_avg_price);
        }
    }
    inverse
        .filter(|t| t.weighted_avg_price > 0.0)
        .map(|t| 1.0 / t.weighted_avg_price)
}

/// Quote volume converted into settlement units
#[inline]
pub fn settlement_volume(ticker: &Ticker24h, rate: f64) -> f64 {
    ticker.quote_volume * rate
}

// === API Response Types ===

#[derive(Debug, Deserialize)]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    #[serde(rename = "baseAsset")]
    pub base_asset: String,
    #[serde(rename = "quoteAsset")]
    pub quote_asset: String,
}

/// Binance spot 24h ticker (subset)
#[derive(Debug, Clone, Deserialize)]
pub struct Ticker24h {
    pub symbol: String,
    /// Base-asset volume
    #[serde(deserialize_with = "de_decimal")]
    pub volume: f64,
    /// Quote-asset volume
    #[serde(rename = "quoteVolume", deserialize_with = "de_decimal")]
    pub quote_volume: f64,
    #[serde(rename = "weightedAvgPrice", deserialize_with = "de_decimal")]
    pub weighted_avg_price: f64,
}

/// Discovery errors
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No tradable pairs found for {0}")]
    NoPairs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCHANGE_INFO: &str = r#"{
        "timezone": "UTC",
        "symbols": [
            {"symbol":"SOLBTC","status":"TRADING","baseAsset":"SOL","quoteAsset":"BTC"},
            {"symbol":"SOLETH","status":"TRADING","baseAsset":"SOL","quoteAsset":"ETH"},
            {"symbol":"SOLUSDT","status":"TRADING","baseAsset":"SOL","quoteAsset":"USDT"},
            {"symbol":"SOLBNB","status":"BREAK","baseAsset":"SOL","quoteAsset":"BNB"},
            {"symbol":"BTCUSDT","status":"TRADING","baseAsset":"BTC","quoteAsset":"USDT"}
        ]
    }"#;

    fn ticker(json: &str) -> Ticker24h {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_select_target_pairs() {
        let info: ExchangeInfo = serde_json::from_str(EXCHANGE_INFO).unwrap();
        let pairs = select_target_pairs(&info, "sol", "USDT", true).unwrap();
        let symbols: Vec<String> = pairs.iter().map(|p| p.symbol_upper()).collect();
        assert_eq!(symbols, vec!["SOLBTC", "SOLETH", "SOLUSDT"]);
    }

    #[test]
    fn test_select_without_settlement_pair() {
        let info: ExchangeInfo = serde_json::from_str(EXCHANGE_INFO).unwrap();
        let pairs = select_target_pairs(&info, "SOL", "USDT", false).unwrap();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.quote() != "USDT"));
    }

    #[test]
    fn test_select_unknown_base() {
        let info: ExchangeInfo = serde_json::from_str(EXCHANGE_INFO).unwrap();
        assert!(matches!(
            select_target_pairs(&info, "DOGE", "USDT", true),
            Err(DiscoveryError::NoPairs(base)) if base == "DOGE"
        ));
    }

    #[test]
    fn test_ticker_deserialize() {
        let t = ticker(
            r#"{"symbol":"SOLBTC","priceChange":"0.1","weightedAvgPrice":"0.00250000",
                "volume":"1000.5","quoteVolume":"2.50125","count":42}"#,
        );
        assert_eq!(t.symbol, "SOLBTC");
        assert_eq!(t.volume, 1000.5);
        assert_eq!(t.quote_volume, 2.50125);
        assert_eq!(t.weighted_avg_price, 0.0025);
    }

    #[test]
    fn test_settlement_rate_direct_and_inverse() {
        let btc = ticker(r#"{"symbol":"BTCUSDT","weightedAvgPrice":"40000","volume":"1","quoteVolume":"1"}"#);
        assert_eq!(settlement_rate(Some(&btc), None), Some(40_000.0));

        let inverse = ticker(r#"{"symbol":"USDTTRY","weightedAvgPrice":"32","volume":"1","quoteVolume":"1"}"#);
        assert_eq!(settlement_rate(None, Some(&inverse)), Some(1.0 / 32.0));

        assert_eq!(settlement_rate(None, None), None);
    }

    #[test]
    fn test_settlement_volume_uses_quote_volume() {
        // 1000 SOL traded for 2.5 BTC at 40k USDT/BTC = 100k USDT
        let t = ticker(r#"{"symbol":"SOLBTC","weightedAvgPrice":"0.0025","volume":"1000","quoteVolume":"2.5"}"#);
        assert_eq!(settlement_volume(&t, 40_000.0), 100_000.0);
    }

    #[test]
    fn test_discovery_creation() {
        let discovery = PairDiscovery::new(&FeedConfig::default()).unwrap();
        assert_eq!(discovery.rest_url, REST_URL);
    }
}
