use async_trait::async_trait;

use crate::{error::MarketDataError, models::MarketSnapshot};

/// Live market data lookup. One outbound call per `fetch`, no caching.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// `symbol` is already normalized and non-empty.
    async fn fetch(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError>;
}
