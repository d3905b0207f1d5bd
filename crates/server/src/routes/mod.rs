//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                             - Embedded-app landing page
//! GET  /health                       - Liveness check (in main)
//! GET  /health/ready                 - Readiness check (in main)
//!
//! # Storefront widget API
//! POST /api/subscribe                - Register a restock subscription
//!
//! # Merchant dashboard API
//! GET  /api/products                 - Proxy the store's product list
//!
//! # Shopify
//! GET  /api/auth                     - Start the OAuth install flow
//! GET  /api/auth/callback            - Finish install: token + webhook setup
//! POST /api/webhooks/product_update  - Inbound stock-change webhook
//! ```

pub mod auth;
pub mod home;
pub mod products;
pub mod subscribe;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::landing))
        .route("/api/subscribe", post(subscribe::subscribe))
        .route("/api/products", get(products::list))
        .route("/api/auth", get(auth::install))
        .route("/api/auth/callback", get(auth::callback))
        .route(
            "/api/webhooks/product_update",
            post(webhooks::product_update),
        )
}
