pub mod alert_store;
pub mod mongo_store;
pub mod db_init;

pub mod market_data;
pub mod coingecko;
pub mod notifier;
pub mod telegram;

pub mod evaluator;
pub mod alert_engine;
pub mod scheduler;

pub mod commands;
pub mod dispatcher;
pub mod messages;
