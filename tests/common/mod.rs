#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use alertbot::{
    error::{MarketDataError, NotifyError, StoreError},
    models::{Alert, Direction, MarketSnapshot, NewAlert, User},
    services::{
        alert_engine::{AlertEngine, EngineOptions},
        alert_store::{AlertStore, MemoryAlertStore},
        market_data::MarketData,
        notifier::Notifier,
    },
};
use async_trait::async_trait;

pub fn snapshot(symbol: &str, price: f64) -> MarketSnapshot {
    MarketSnapshot {
        symbol: symbol.to_string(),
        current_price: price,
        market_cap: 1_000_000,
        circulating_supply: 50_000,
        volume_24h: 25_000,
        price_change_pct_24h: 1.5,
    }
}

/// Market data keyed by symbol; unknown symbols are `NotFound`.
#[derive(Default)]
pub struct FakeMarket {
    answers: Mutex<HashMap<String, Result<MarketSnapshot, MarketDataError>>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeMarket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.answers
            .lock()
            .unwrap()
            .insert(symbol.to_string(), Ok(snapshot(symbol, price)));
    }

    pub fn set_error(&self, symbol: &str, err: MarketDataError) {
        self.answers.lock().unwrap().insert(symbol.to_string(), Err(err));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self, symbol: &str) -> usize {
        self.calls.lock().unwrap().get(symbol).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn fetch(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        *self.calls.lock().unwrap().entry(symbol.to_string()).or_default() += 1;

        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        self.answers
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Err(MarketDataError::NotFound(symbol.to_string())))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().insert(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(r, _)| r == recipient)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, recipient_external_id: &str, text: &str) -> Result<(), NotifyError> {
        if self.failing.lock().unwrap().contains(recipient_external_id) {
            return Err(NotifyError::Delivery("recipient blocked the bot".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient_external_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Memory store whose reads and writes for one external id fail with a
/// backend error; everyone else is served normally.
pub struct FailingStore {
    pub inner: MemoryAlertStore,
    broken: String,
}

impl FailingStore {
    pub fn for_user(external_id: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryAlertStore::new(),
            broken: external_id.to_string(),
        })
    }

    fn check(&self, external_id: &str) -> Result<(), StoreError> {
        if external_id == self.broken {
            return Err(StoreError::Backend(format!("connection reset while reading {external_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertStore for FailingStore {
    async fn create_user(&self, external_id: &str, display_name: Option<&str>) -> Result<User, StoreError> {
        self.check(external_id)?;
        self.inner.create_user(external_id, display_name).await
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        self.check(external_id)?;
        self.inner.find_user_by_external_id(external_id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.inner.list_users().await
    }

    async fn create_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        self.check(&alert.owner_external_id)?;
        self.inner.create_alert(alert).await
    }

    async fn delete_alert(&self, id: i64) -> Result<bool, StoreError> {
        self.inner.delete_alert(id).await
    }

    async fn find_alert(&self, id: i64) -> Result<Option<Alert>, StoreError> {
        self.inner.find_alert(id).await
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>, StoreError> {
        self.inner.list_alerts().await
    }

    async fn list_alerts_by_owner(&self, external_id: &str) -> Result<Vec<Alert>, StoreError> {
        self.check(external_id)?;
        self.inner.list_alerts_by_owner(external_id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

pub struct Harness {
    pub store: Arc<MemoryAlertStore>,
    pub market: Arc<FakeMarket>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: Arc<AlertEngine>,
}

pub fn harness() -> Harness {
    harness_with(EngineOptions::default())
}

pub fn harness_with(options: EngineOptions) -> Harness {
    let store = Arc::new(MemoryAlertStore::new());
    let market = FakeMarket::new();
    let notifier = RecordingNotifier::new();
    let engine = Arc::new(AlertEngine::new(
        store.clone(),
        market.clone(),
        notifier.clone(),
        options,
    ));

    Harness {
        store,
        market,
        notifier,
        engine,
    }
}

pub async fn register(store: &MemoryAlertStore, external_id: &str) {
    store.create_user(external_id, Some("tester")).await.unwrap();
}

pub async fn add_alert(
    store: &MemoryAlertStore,
    owner: &str,
    symbol: &str,
    threshold: f64,
    direction: Direction,
) -> i64 {
    store
        .create_alert(NewAlert::new(owner, symbol, threshold, direction))
        .await
        .unwrap()
        .id
}
