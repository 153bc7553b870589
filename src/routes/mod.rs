use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;
pub mod uploads;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/categories", products::categories_router())
        .nest("/tags", products::tags_router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/payment-methods", payments::router())
        .nest("/uploads", uploads::router())
        .nest("/admin", admin::router())
}
