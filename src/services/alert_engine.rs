use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use futures_util::{stream, StreamExt};
use tokio::time::timeout;

use crate::{
    error::{MarketDataError, NotifyError, StoreError},
    models::{normalize_symbol, Alert, MarketSnapshot, User},
};

use super::{
    alert_store::AlertStore,
    evaluator::evaluate,
    market_data::MarketData,
    messages,
    notifier::Notifier,
};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub fetch_timeout: Duration,
    pub send_timeout: Duration,
    /// Max symbol fetches in flight during one sweep.
    pub fetch_concurrency: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(10),
            fetch_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriggeredAlert {
    pub alert: Alert,
    pub owner: User,
    pub snapshot: MarketSnapshot,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    pub alerts: usize,
    pub symbols: usize,
    /// Ordered by alert id.
    pub triggered: Vec<TriggeredAlert>,
    pub failed_symbols: Vec<String>,
    pub delivery_failures: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestReport {
    pub users: usize,
    pub sent: usize,
    pub failures: usize,
}

/// Re-evaluates stored alerts against live prices and sends the daily digest.
///
/// The engine keeps no state between runs: every sweep that still satisfies
/// an alert's condition notifies again.
pub struct AlertEngine {
    store: Arc<dyn AlertStore>,
    market: Arc<dyn MarketData>,
    notifier: Arc<dyn Notifier>,
    options: EngineOptions,
}

impl AlertEngine {
    pub fn new(
        store: Arc<dyn AlertStore>,
        market: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
        options: EngineOptions,
    ) -> Self {
        Self {
            store,
            market,
            notifier,
            options,
        }
    }

    /// One evaluation pass over all alerts. Only a failure to list alerts
    /// fails the whole sweep; a bad symbol, owner lookup or delivery is
    /// logged and skipped.
    pub async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let alerts = self.store.list_alerts().await?;

        let mut report = SweepReport {
            alerts: alerts.len(),
            ..Default::default()
        };

        // one quote request per symbol per sweep
        let mut by_symbol: BTreeMap<String, Vec<Alert>> = BTreeMap::new();
        for a in alerts {
            by_symbol.entry(normalize_symbol(&a.symbol)).or_default().push(a);
        }
        report.symbols = by_symbol.len();

        if by_symbol.is_empty() {
            return Ok(report);
        }

        let market = self.market.clone();
        let limit = self.options.fetch_timeout;
        let fetched: Vec<(String, Vec<Alert>, Result<MarketSnapshot, MarketDataError>)> =
            stream::iter(by_symbol)
                .map(move |(sym, group)| {
                    let market = market.clone();
                    async move {
                        let res = fetch_with_timeout(market.as_ref(), limit, &sym).await;
                        (sym, group, res)
                    }
                })
                .buffer_unordered(self.options.fetch_concurrency.max(1))
                .collect()
                .await;

        let mut owners: HashMap<String, Option<User>> = HashMap::new();

        for (sym, group, res) in fetched {
            let snapshot = match res {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(symbol = %sym, alerts = group.len(), "skipping symbol: {}", e);
                    report.failed_symbols.push(sym);
                    continue;
                }
            };

            for a in group {
                if !evaluate(&a, &snapshot) {
                    continue;
                }

                let Some(owner) = self.resolve_owner(&mut owners, &a.owner_external_id).await else {
                    continue;
                };

                report.triggered.push(TriggeredAlert {
                    alert: a,
                    owner,
                    snapshot: snapshot.clone(),
                });
            }
        }

        report.failed_symbols.sort();
        report.triggered.sort_by_key(|t| t.alert.id);

        for t in &report.triggered {
            let text = messages::triggered(&t.alert, &t.snapshot);
            if let Err(e) = self.notify(&t.owner.external_id, &text).await {
                tracing::warn!(alert_id = t.alert.id, recipient = %t.owner.external_id, "alert notification failed: {}", e);
                report.delivery_failures += 1;
            }
        }

        tracing::info!(
            alerts = report.alerts,
            symbols = report.symbols,
            triggered = report.triggered.len(),
            failed_symbols = report.failed_symbols.len(),
            delivery_failures = report.delivery_failures,
            "sweep finished"
        );

        Ok(report)
    }

    /// Sends each user with at least one alert a single enumerated summary.
    pub async fn digest(&self) -> Result<DigestReport, StoreError> {
        let users = self.store.list_users().await?;

        let mut report = DigestReport {
            users: users.len(),
            ..Default::default()
        };

        for user in users {
            let alerts = match self.store.list_alerts_by_owner(&user.external_id).await {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(recipient = %user.external_id, "digest: listing alerts failed: {}", e);
                    report.failures += 1;
                    continue;
                }
            };

            if alerts.is_empty() {
                continue;
            }

            match self.notify(&user.external_id, &messages::digest(&alerts)).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::warn!(recipient = %user.external_id, "digest notification failed: {}", e);
                    report.failures += 1;
                }
            }
        }

        tracing::info!(
            users = report.users,
            sent = report.sent,
            failures = report.failures,
            "digest finished"
        );

        Ok(report)
    }

    async fn notify(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        timeout(self.options.send_timeout, self.notifier.send(recipient, text))
            .await
            .unwrap_or(Err(NotifyError::Timeout))
    }

    // Cached per sweep; a lookup error is not cached so it only costs this alert.
    async fn resolve_owner(
        &self,
        cache: &mut HashMap<String, Option<User>>,
        external_id: &str,
    ) -> Option<User> {
        if let Some(hit) = cache.get(external_id) {
            return hit.clone();
        }

        match self.store.find_user_by_external_id(external_id).await {
            Ok(found) => {
                if found.is_none() {
                    tracing::warn!(owner = external_id, "alert owner is not registered, skipping");
                }
                cache.insert(external_id.to_string(), found.clone());
                found
            }
            Err(e) => {
                tracing::warn!(owner = external_id, "owner lookup failed: {}", e);
                None
            }
        }
    }
}

async fn fetch_with_timeout(
    market: &dyn MarketData,
    limit: Duration,
    symbol: &str,
) -> Result<MarketSnapshot, MarketDataError> {
    timeout(limit, market.fetch(symbol))
        .await
        .unwrap_or_else(|_| Err(MarketDataError::Transient(format!("fetch of {symbol} timed out"))))
}
