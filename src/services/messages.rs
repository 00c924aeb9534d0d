use crate::models::{Alert, MarketSnapshot};

pub const WELCOME: &str = "Welcome to the crypto alert bot! Use /register to get started.";
pub const REGISTERED: &str = "You are now registered!";
pub const ALREADY_REGISTERED: &str = "You are already registered.";
pub const REGISTER_FIRST: &str = "You need to register first using /register.";
pub const ALERT_SET: &str = "Alert set successfully!";
pub const ALERT_REMOVED: &str = "Alert removed successfully!";
pub const ALERT_NOT_FOUND: &str = "Alert not found. Please check the alert ID.";
pub const NO_ALERTS: &str = "No active alerts found.";
pub const QUOTE_NOT_FOUND: &str = "No data found. Please check the token symbol and try again.";
pub const QUOTE_UNAVAILABLE: &str = "Failed to fetch market data right now. Please try again later.";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";

pub fn help() -> String {
    [
        "Commands:",
        "/register - Register with the bot",
        "/get_token [token symbol] - Get cryptocurrency data",
        "/set_alert [token symbol] [price threshold] [above/below] - Set a price alert",
        "/list_alerts - List all alerts",
        "/remove_alert [alert ID] - Remove an alert",
    ]
    .join("\n")
}

pub fn quote(s: &MarketSnapshot) -> String {
    format!(
        "Symbol: {}\nCurrent Price: ${:.2}\nMarket Cap: ${}\nCirculating Supply: {}\n24h Trading Volume: ${}\nPrice Change (24h): {:.2}%",
        s.symbol.to_uppercase(),
        s.current_price,
        s.market_cap,
        s.circulating_supply,
        s.volume_24h,
        s.price_change_pct_24h,
    )
}

pub fn alert_line(pos: usize, a: &Alert) -> String {
    format!(
        "{}. [{}] {} - {} ${:.2}",
        pos,
        a.id,
        a.symbol.to_uppercase(),
        a.direction,
        a.threshold
    )
}

fn enumerate(header: &str, alerts: &[Alert]) -> String {
    let mut out = String::from(header);
    for (i, a) in alerts.iter().enumerate() {
        out.push('\n');
        out.push_str(&alert_line(i + 1, a));
    }
    out
}

pub fn alert_list(alerts: &[Alert]) -> String {
    if alerts.is_empty() {
        return NO_ALERTS.to_string();
    }
    enumerate("Your active alerts:", alerts)
}

pub fn digest(alerts: &[Alert]) -> String {
    enumerate("Daily summary of your active alerts:", alerts)
}

pub fn triggered(a: &Alert, s: &MarketSnapshot) -> String {
    format!(
        "Alert triggered: {} is {} ${:.2}. Current price: ${:.2}",
        a.symbol.to_uppercase(),
        a.direction,
        a.threshold,
        s.current_price
    )
}
