use axum::{routing::put, Router};

pub mod clients;
pub mod items;
pub mod payments;
pub mod reservations;
pub mod services;
pub mod system;

/// Router for every catalog endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/clients", clients::router())
        .nest("/items", items::router())
        .nest("/services", services::router())
        .route("/usages/:id", put(services::update_usage).delete(services::remove_usage))
        .nest("/reservations", reservations::router())
        .nest("/payments", payments::router())
}
