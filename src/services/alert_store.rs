use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    models::{Alert, NewAlert, User},
};

/// Persistent users and alerts, shared by the command loop and the scheduler.
///
/// Every call is atomic on its own: a reader never sees a half-written
/// record. Nothing is locked across calls, so callers must tolerate
/// staleness between a read and a later write.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn create_user(&self, external_id: &str, display_name: Option<&str>) -> Result<User, StoreError>;
    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn create_alert(&self, alert: NewAlert) -> Result<Alert, StoreError>;
    /// Returns false when no alert had that id.
    async fn delete_alert(&self, id: i64) -> Result<bool, StoreError>;
    async fn find_alert(&self, id: i64) -> Result<Option<Alert>, StoreError>;
    async fn list_alerts(&self) -> Result<Vec<Alert>, StoreError>;
    /// Alerts of one owner, oldest first.
    async fn list_alerts_by_owner(&self, external_id: &str) -> Result<Vec<Alert>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<String, User>,
    alerts: BTreeMap<i64, Alert>,
    last_user_id: i64,
    last_alert_id: i64,
}

/// Process-local store. Each operation takes the lock once, so writes are
/// all-or-nothing for concurrent readers.
#[derive(Default)]
pub struct MemoryAlertStore {
    inner: RwLock<MemoryState>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn create_user(&self, external_id: &str, display_name: Option<&str>) -> Result<User, StoreError> {
        let mut st = self.inner.write().await;
        if st.users.contains_key(external_id) {
            return Err(StoreError::Duplicate(format!("user {external_id}")));
        }

        st.last_user_id += 1;
        let user = User {
            id: st.last_user_id,
            external_id: external_id.to_string(),
            display_name: display_name.map(str::to_string),
            created_at: Utc::now().timestamp(),
        };
        st.users.insert(user.external_id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(external_id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let st = self.inner.read().await;
        let mut users: Vec<User> = st.users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn create_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        let mut st = self.inner.write().await;
        st.last_alert_id += 1;
        let alert = Alert {
            id: st.last_alert_id,
            owner_external_id: alert.owner_external_id,
            symbol: alert.symbol,
            threshold: alert.threshold,
            direction: alert.direction,
            created_at: Utc::now().timestamp(),
        };
        st.alerts.insert(alert.id, alert.clone());
        Ok(alert)
    }

    async fn delete_alert(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.alerts.remove(&id).is_some())
    }

    async fn find_alert(&self, id: i64) -> Result<Option<Alert>, StoreError> {
        Ok(self.inner.read().await.alerts.get(&id).cloned())
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(self.inner.read().await.alerts.values().cloned().collect())
    }

    async fn list_alerts_by_owner(&self, external_id: &str) -> Result<Vec<Alert>, StoreError> {
        // ids are handed out in creation order, so map order is creation order
        Ok(self
            .inner
            .read()
            .await
            .alerts
            .values()
            .filter(|a| a.owner_external_id == external_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
