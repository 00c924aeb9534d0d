use thiserror::Error;

/// Failures from the market data source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    #[error("no market data for symbol: {0}")]
    NotFound(String),

    #[error("market data unavailable: {0}")]
    Transient(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("store error: {0}")]
    Backend(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        let msg = e.to_string();
        if msg.contains("E11000") {
            StoreError::Duplicate(msg)
        } else {
            StoreError::Backend(msg)
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("delivery timed out")]
    Timeout,
}

/// Malformed command input. The `Display` text is what the user sees.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid price threshold '{0}'. Use a non-negative number, e.g. 100.50")]
    InvalidThreshold(String),

    #[error("Invalid direction '{0}'. Use 'above' or 'below'.")]
    InvalidDirection(String),

    #[error("Invalid alert ID '{0}'. Use the number shown by /list_alerts.")]
    InvalidAlertId(String),

    #[error("Unknown command {0}. Send /help to see what I can do.")]
    UnknownCommand(String),
}
