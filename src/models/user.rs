use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: i64,

    // chat platform account id, unique per user
    pub external_id: String,

    #[serde(default)]
    pub display_name: Option<String>,

    pub created_at: i64,
}
