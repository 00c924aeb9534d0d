use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" => Ok(Direction::Above),
            "below" => Ok(Direction::Below),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "_id")]
    pub id: i64,

    pub owner_external_id: String,

    // normalized, see `normalize_symbol`
    pub symbol: String,

    pub threshold: f64,
    pub direction: Direction,

    pub created_at: i64,
}

/// Alert fields supplied by the caller; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub owner_external_id: String,
    pub symbol: String,
    pub threshold: f64,
    pub direction: Direction,
}

impl NewAlert {
    pub fn new(owner_external_id: &str, symbol: &str, threshold: f64, direction: Direction) -> Self {
        Self {
            owner_external_id: owner_external_id.to_string(),
            symbol: normalize_symbol(symbol),
            threshold,
            direction,
        }
    }
}

/// Symbols are case-insensitive and stored lower-case.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_lowercase()
}
