use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{error::MarketDataError, models::MarketSnapshot};

use super::market_data::MarketData;

#[derive(Clone)]
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    vs_currency: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, vs_currency: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            vs_currency: vs_currency.to_string(),
        })
    }

    pub async fn markets(&self, symbol: &str) -> Result<Vec<CoinMarket>, MarketDataError> {
        let url = format!("{}/coins/markets", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[("vs_currency", self.vs_currency.as_str()), ("ids", symbol)])
            .send()
            .await
            .map_err(|e| MarketDataError::Transient(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(MarketDataError::Transient(format!(
                "CoinGecko markets failed: {status} {body}"
            )));
        }

        res.json::<Vec<CoinMarket>>()
            .await
            .map_err(|e| MarketDataError::Transient(e.to_string()))
    }
}

#[async_trait]
impl MarketData for CoinGeckoClient {
    async fn fetch(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        let records = self.markets(symbol).await?;
        snapshot_from_markets(symbol, records)
    }
}

/// Picks the first record of a `/coins/markets` response; an empty set
/// means the symbol is unknown upstream. The snapshot carries the ticker
/// CoinGecko reports (`eth`), not the requested coin id (`ethereum`).
pub fn snapshot_from_markets(
    symbol: &str,
    records: Vec<CoinMarket>,
) -> Result<MarketSnapshot, MarketDataError> {
    let Some(m) = records.into_iter().next() else {
        return Err(MarketDataError::NotFound(symbol.to_string()));
    };

    let current_price = m
        .current_price
        .filter(|p| p.is_finite())
        .ok_or_else(|| MarketDataError::Transient(format!("no current price for {symbol}")))?;

    let ticker = m.symbol.trim();

    Ok(MarketSnapshot {
        symbol: if ticker.is_empty() { symbol } else { ticker }.to_string(),
        current_price,
        market_cap: whole(m.market_cap),
        circulating_supply: whole(m.circulating_supply),
        volume_24h: whole(m.total_volume),
        price_change_pct_24h: m.price_change_percentage_24h.unwrap_or(0.0),
    })
}

fn whole(v: Option<f64>) -> i64 {
    v.filter(|x| x.is_finite()).map(|x| x as i64).unwrap_or(0)
}

// CoinGecko sends numbers as floats and nulls for unknown values.
#[derive(Debug, Deserialize, Serialize)]
pub struct CoinMarket {
    pub id: String,
    pub symbol: String,

    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}
