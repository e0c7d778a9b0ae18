use axum::{routing::post, Router};

pub mod compositions;
pub mod counts;
pub mod movements;
pub mod production;
pub mod products;
pub mod system;

/// Router for every warehouse endpoint.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/movements", movements::router())
        .nest("/compositions", compositions::router())
        .nest("/production-orders", production::router())
        .route("/simulations", post(production::simulate))
        .nest("/inventory-counts", counts::router())
}
