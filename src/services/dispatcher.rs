use std::sync::Arc;

use crate::{
    error::{MarketDataError, StoreError},
    models::{Direction, NewAlert},
};

use super::{
    alert_store::AlertStore,
    commands::Command,
    market_data::MarketData,
    messages,
};

/// One inbound chat message with the sender's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingCommand {
    pub external_id: String,
    pub display_name: Option<String>,
    pub text: String,
}

/// Handles user commands against the store. Holds no state of its own;
/// each command is answered from the store contents at that moment.
pub struct CommandDispatcher {
    store: Arc<dyn AlertStore>,
    market: Arc<dyn MarketData>,
}

impl CommandDispatcher {
    pub fn new(store: Arc<dyn AlertStore>, market: Arc<dyn MarketData>) -> Self {
        Self { store, market }
    }

    /// Returns the reply for the caller, or `None` when the message was not
    /// a command. Never fails: every error becomes a reply.
    pub async fn handle(&self, incoming: &IncomingCommand) -> Option<String> {
        let cmd = match Command::parse(&incoming.text) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return None,
            Err(e) => return Some(e.to_string()),
        };

        let caller = incoming.external_id.as_str();

        let reply = match cmd {
            Command::Start => Ok(messages::WELCOME.to_string()),
            Command::Help => Ok(messages::help()),
            Command::Register => self.register(caller, incoming.display_name.as_deref()).await,
            Command::GetQuote { symbol } => Ok(self.quote(&symbol).await),
            Command::SetAlert { symbol, threshold, direction } => {
                self.set_alert(caller, &symbol, threshold, direction).await
            }
            Command::ListAlerts => self.list_alerts(caller).await,
            Command::RemoveAlert { id } => self.remove_alert(caller, id).await,
        };

        Some(reply.unwrap_or_else(|e| {
            tracing::error!(caller, "command failed: {}", e);
            messages::GENERIC_FAILURE.to_string()
        }))
    }

    async fn register(&self, caller: &str, display_name: Option<&str>) -> Result<String, StoreError> {
        if self.store.find_user_by_external_id(caller).await?.is_some() {
            return Ok(messages::ALREADY_REGISTERED.to_string());
        }

        match self.store.create_user(caller, display_name).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, caller, "registered user");
                Ok(messages::REGISTERED.to_string())
            }
            // lost a race with a concurrent registration of the same account
            Err(StoreError::Duplicate(_)) => Ok(messages::ALREADY_REGISTERED.to_string()),
            Err(e) => Err(e),
        }
    }

    async fn quote(&self, symbol: &str) -> String {
        match self.market.fetch(symbol).await {
            Ok(snapshot) => messages::quote(&snapshot),
            Err(MarketDataError::NotFound(_)) => messages::QUOTE_NOT_FOUND.to_string(),
            Err(e @ MarketDataError::Transient(_)) => {
                tracing::warn!(symbol, "quote fetch failed: {}", e);
                messages::QUOTE_UNAVAILABLE.to_string()
            }
        }
    }

    async fn set_alert(
        &self,
        caller: &str,
        symbol: &str,
        threshold: f64,
        direction: Direction,
    ) -> Result<String, StoreError> {
        if self.store.find_user_by_external_id(caller).await?.is_none() {
            return Ok(messages::REGISTER_FIRST.to_string());
        }

        let alert = self
            .store
            .create_alert(NewAlert::new(caller, symbol, threshold, direction))
            .await?;

        tracing::info!(alert_id = alert.id, caller, symbol = %alert.symbol, "alert created");
        Ok(messages::ALERT_SET.to_string())
    }

    async fn list_alerts(&self, caller: &str) -> Result<String, StoreError> {
        if self.store.find_user_by_external_id(caller).await?.is_none() {
            return Ok(messages::REGISTER_FIRST.to_string());
        }

        let alerts = self.store.list_alerts_by_owner(caller).await?;
        Ok(messages::alert_list(&alerts))
    }

    // Only the owner may remove an alert; someone else's id reads as missing.
    async fn remove_alert(&self, caller: &str, id: i64) -> Result<String, StoreError> {
        let owned = self
            .store
            .find_alert(id)
            .await?
            .is_some_and(|a| a.owner_external_id == caller);

        if !owned || !self.store.delete_alert(id).await? {
            return Ok(messages::ALERT_NOT_FOUND.to_string());
        }

        tracing::info!(alert_id = id, caller, "alert removed");
        Ok(messages::ALERT_REMOVED.to_string())
    }
}
