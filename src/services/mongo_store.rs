use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::StoreError,
    models::{Alert, NewAlert, User},
};

use super::alert_store::AlertStore;

const USERS: &str = "users";
const ALERTS: &str = "alerts";
const COUNTERS: &str = "counters";

#[derive(Debug, Serialize, Deserialize)]
struct Counter {
    #[serde(rename = "_id")]
    id: String,
    seq: i64,
}

/// MongoDB-backed store. Every write touches a single document, which
/// MongoDB applies atomically.
#[derive(Clone)]
pub struct MongoAlertStore {
    db: Database,
}

impl MongoAlertStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection::<User>(USERS)
    }

    fn alerts(&self) -> Collection<Alert> {
        self.db.collection::<Alert>(ALERTS)
    }

    // Sequential ids so users can type them back into /remove_alert.
    async fn next_id(&self, name: &str) -> Result<i64, StoreError> {
        let counters = self.db.collection::<Counter>(COUNTERS);
        let opts = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = counters
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } }, opts)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("counter {name} missing after upsert")))?;

        Ok(counter.seq)
    }

    async fn collect_alerts(&self, filter: Document) -> Result<Vec<Alert>, StoreError> {
        let find_opts = FindOptions::builder()
            .sort(doc! { "created_at": 1, "_id": 1 })
            .build();

        let mut cursor = self.alerts().find(filter, find_opts).await?;

        let mut items: Vec<Alert> = Vec::new();
        while let Some(res) = cursor.next().await {
            items.push(res?);
        }

        Ok(items)
    }
}

#[async_trait]
impl AlertStore for MongoAlertStore {
    async fn create_user(&self, external_id: &str, display_name: Option<&str>) -> Result<User, StoreError> {
        let user = User {
            id: self.next_id(USERS).await?,
            external_id: external_id.to_string(),
            display_name: display_name.map(str::to_string),
            created_at: Utc::now().timestamp(),
        };

        // unique index on external_id turns a racing registration into E11000
        self.users().insert_one(&user, None).await?;
        Ok(user)
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users()
            .find_one(doc! { "external_id": external_id }, None)
            .await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let find_opts = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let mut cursor = self.users().find(doc! {}, find_opts).await?;

        let mut users = Vec::new();
        while let Some(res) = cursor.next().await {
            users.push(res?);
        }

        Ok(users)
    }

    async fn create_alert(&self, alert: NewAlert) -> Result<Alert, StoreError> {
        let alert = Alert {
            id: self.next_id(ALERTS).await?,
            owner_external_id: alert.owner_external_id,
            symbol: alert.symbol,
            threshold: alert.threshold,
            direction: alert.direction,
            created_at: Utc::now().timestamp(),
        };

        self.alerts().insert_one(&alert, None).await?;
        Ok(alert)
    }

    async fn delete_alert(&self, id: i64) -> Result<bool, StoreError> {
        let res = self.alerts().delete_one(doc! { "_id": id }, None).await?;
        Ok(res.deleted_count > 0)
    }

    async fn find_alert(&self, id: i64) -> Result<Option<Alert>, StoreError> {
        Ok(self.alerts().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>, StoreError> {
        self.collect_alerts(doc! {}).await
    }

    async fn list_alerts_by_owner(&self, external_id: &str) -> Result<Vec<Alert>, StoreError> {
        self.collect_alerts(doc! { "owner_external_id": external_id }).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
