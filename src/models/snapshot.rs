use serde::{Deserialize, Serialize};

/// Market data for one symbol at fetch time. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub market_cap: i64,
    pub circulating_supply: i64,
    pub volume_24h: i64,
    // percentage units, e.g. -2.5 means -2.5%
    pub price_change_pct_24h: f64,
}
