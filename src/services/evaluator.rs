use crate::models::{Alert, Direction, MarketSnapshot};

/// Whether `alert` fires against `snapshot`. Strict comparison in both
/// directions: a price equal to the threshold never fires.
pub fn evaluate(alert: &Alert, snapshot: &MarketSnapshot) -> bool {
    match alert.direction {
        Direction::Above => snapshot.current_price > alert.threshold,
        Direction::Below => snapshot.current_price < alert.threshold,
    }
}
