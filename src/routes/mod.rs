use axum::Router;

use crate::{AppState, controllers::health_controller};

pub mod health_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = health_routes::add_routes(router);

    router
        .fallback(health_controller::not_found)
        .with_state(state)
}
