use std::{env, time::Duration};

use chrono::NaiveTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub telegram_poll_timeout_secs: u64,

    pub coingecko_api_url: String,
    pub vs_currency: String,

    pub store_backend: StoreBackend,
    pub mongodb_uri: String,
    pub mongodb_db: String,

    pub sweep_interval: Duration,
    pub digest_time: NaiveTime,
    pub fetch_timeout: Duration,
    pub send_timeout: Duration,
    pub fetch_concurrency: usize,

    pub host: String,
    pub port: u16,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Parses `HH:MM` (or `HH:MM:SS`) into a wall-clock time.
pub fn parse_digest_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn default_digest_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default()
}

pub fn load() -> Settings {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let store_backend = match var_or("STORE_BACKEND", "mongo").to_lowercase().as_str() {
        "memory" => StoreBackend::Memory,
        _ => StoreBackend::Mongo,
    };

    let digest_time = env::var("DIGEST_TIME")
        .ok()
        .and_then(|s| parse_digest_time(&s))
        .unwrap_or_else(default_digest_time);

    let fetch_concurrency = parsed_or("FETCH_CONCURRENCY", 4usize).max(1);

    Settings {
        telegram_token: var_or("TELEGRAM_TOKEN", ""),
        telegram_api_url: var_or("TELEGRAM_API_URL", "https://api.telegram.org"),
        telegram_poll_timeout_secs: parsed_or("TELEGRAM_POLL_TIMEOUT_SECS", 50),

        coingecko_api_url: var_or("COINGECKO_API_URL", "https://api.coingecko.com/api/v3"),
        vs_currency: var_or("VS_CURRENCY", "usd"),

        store_backend,
        mongodb_uri: var_or("MONGODB_URI", "mongodb://localhost:27017"),
        mongodb_db: var_or("MONGODB_DB", "alertbot"),

        sweep_interval: Duration::from_secs(parsed_or("SWEEP_INTERVAL_SECS", 300u64).max(1)),
        digest_time,
        fetch_timeout: Duration::from_secs(parsed_or("FETCH_TIMEOUT_SECS", 10)),
        send_timeout: Duration::from_secs(parsed_or("SEND_TIMEOUT_SECS", 10)),
        fetch_concurrency,

        host: var_or("HOST", "127.0.0.1"),
        port: parsed_or("PORT", 3000),
    }
}
