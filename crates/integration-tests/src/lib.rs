//! End-to-end tests for the restock alerts app.
//!
//! # Running Tests
//!
//! These tests drive a *running* server over HTTP and inspect the
//! database directly, so they are `#[ignore]`d by default.
//!
//! ```bash
//! # Start Postgres and the server (migrations run on boot)
//! docker compose up -d postgres
//! cargo run -p restock-alerts-server
//!
//! # Run the ignored tests
//! cargo test -p restock-alerts-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `RESTOCK_BASE_URL` - Server under test (default: <http://localhost:8000>)
//! - `RESTOCK_TEST_DATABASE_URL` - Same database the server uses
//!
//! For the notification-path tests the server must be started with
//! `WA_API_BASE` pointed at a stub that accepts every send (any HTTP
//! server answering 200 on `POST /{id}/messages`). The failed-send test
//! instead expects a server started *without* WhatsApp credentials, so
//! every send fails and leads stay pending.

use reqwest::Client;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Shared handles for one test: an HTTP client for the API surface and a
/// pool for asserting on database state.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the server under test and its database.
    ///
    /// # Panics
    ///
    /// Panics if `RESTOCK_TEST_DATABASE_URL` is unset or unreachable.
    pub async fn new() -> Self {
        let base_url = std::env::var("RESTOCK_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        let database_url = std::env::var("RESTOCK_TEST_DATABASE_URL")
            .expect("RESTOCK_TEST_DATABASE_URL must point at the server's database");

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .expect("failed to connect to test database");

        Self {
            client: Client::new(),
            base_url,
            pool,
        }
    }

    /// Seed credentials for a shop so intake accepts subscriptions for it.
    pub async fn seed_shop(&self, shop: &str) {
        sqlx::query(
            r"
            INSERT INTO shop (shop, access_token, scope)
            VALUES ($1, 'shpat_test', 'read_products,read_inventory')
            ON CONFLICT(shop) DO NOTHING
            ",
        )
        .bind(shop)
        .execute(&self.pool)
        .await
        .expect("failed to seed shop credentials");
    }

    /// Remove all leads for a shop, leaving other tenants untouched.
    pub async fn clear_leads(&self, shop: &str) {
        sqlx::query("DELETE FROM lead WHERE shop = $1")
            .bind(shop)
            .execute(&self.pool)
            .await
            .expect("failed to clear leads");
    }

    /// Count leads for a (shop, product) pair by status.
    pub async fn count_leads(&self, shop: &str, product_id: &str, status: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            r"
            SELECT COUNT(*) FROM lead
            WHERE shop = $1 AND product_id = $2 AND status = $3::lead_status
            ",
        )
        .bind(shop)
        .bind(product_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .expect("failed to count leads")
    }
}

/// A nonce for unique per-test shops and phone numbers, so parallel runs
/// don't trample each other.
#[must_use]
pub fn nonce() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{nanos:x}")
}
