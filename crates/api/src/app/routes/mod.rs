use axum::{routing::get, Router};

pub mod accounts;
pub mod admin;
pub mod backup;
pub mod common;
pub mod journal;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/products", products::router())
        .nest("/purchases", purchases::router())
        .nest("/sales", sales::router())
        .nest("/accounts", accounts::router())
        .nest("/journal", journal::router())
        .nest("/reports", reports::router())
        .nest("/backup", backup::router())
        .route("/restore", axum::routing::post(backup::restore))
        .nest("/admin", admin::router())
}
