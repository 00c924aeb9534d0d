//! Library entrypoint for AlertBot.
//!
//! The binary only wires things together; integration tests under `tests/`
//! drive the engine, dispatcher and routes through this crate.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub mod controllers;
pub mod routes;

use services::alert_store::AlertStore;

/// State of the health router.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AlertStore>,
}
