//! Shop credential repository for database operations.
//!
//! Stores the per-store Shopify Admin API access token obtained during the
//! OAuth install flow. The intake path and the product proxy only read;
//! writes happen exclusively in the OAuth callback.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::PgPool;

use super::RepositoryError;

/// Stored OAuth credentials for one installed shop.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopCredentials {
    /// Shop domain (e.g., acme.myshopify.com).
    pub shop: String,
    /// Admin API access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
    /// Granted scopes, comma separated as Shopify returns them.
    pub scope: String,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for ShopCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopCredentials")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopRow {
    shop: String,
    access_token: String,
    scope: String,
    updated_at: DateTime<Utc>,
}

impl From<ShopRow> for ShopCredentials {
    fn from(row: ShopRow) -> Self {
        Self {
            shop: row.shop,
            access_token: SecretString::from(row.access_token),
            scope: row.scope,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for shop credential database operations.
pub struct ShopRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShopRepository<'a> {
    /// Create a new shop repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get credentials for a shop.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, shop: &str) -> Result<Option<ShopCredentials>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopRow>(
            r"
            SELECT shop, access_token, scope, updated_at
            FROM shop
            WHERE shop = $1
            ",
        )
        .bind(shop)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ShopCredentials::from))
    }

    /// Save or update credentials for a shop.
    ///
    /// Uses upsert so a re-install refreshes the token in place.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        shop: &str,
        access_token: &str,
        scope: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop (shop, access_token, scope)
            VALUES ($1, $2, $3)
            ON CONFLICT(shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                updated_at = now()
            ",
        )
        .bind(shop)
        .bind(access_token)
        .bind(scope)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
