pub mod user;
pub mod alert;
pub mod snapshot;

pub use user::User;
pub use alert::{normalize_symbol, Alert, Direction, NewAlert};
pub use snapshot::MarketSnapshot;
