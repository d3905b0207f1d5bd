//! Lead repository for database operations.
//!
//! A lead is one customer's request to be told when one product is back in
//! stock at one store. The repository owns the full lead lifecycle: the
//! intake path inserts `pending` rows, the reconciler claims them
//! (`pending -> notified`) and releases them again if delivery fails.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use restock_alerts_core::{LeadId, LeadStatus, PhoneNumber};

use super::RepositoryError;

/// A stored restock subscription request.
#[derive(Debug, Clone)]
pub struct Lead {
    pub id: LeadId,
    /// Tenant shop domain (e.g., acme.myshopify.com).
    pub shop: String,
    /// Product ID in canonical string form, matching webhook payloads.
    pub product_id: String,
    pub product_title: String,
    pub customer_name: String,
    pub phone_number: PhoneNumber,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the lead transitions to `notified`.
    pub notified_at: Option<DateTime<Utc>>,
}

/// Fields required to insert a new lead.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub shop: String,
    pub product_id: String,
    pub product_title: String,
    pub customer_name: String,
    pub phone_number: PhoneNumber,
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: LeadId,
    shop: String,
    product_id: String,
    product_title: String,
    customer_name: String,
    phone_number: String,
    status: LeadStatus,
    created_at: DateTime<Utc>,
    notified_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeadRow> for Lead {
    type Error = RepositoryError;

    fn try_from(row: LeadRow) -> Result<Self, Self::Error> {
        let phone_number = PhoneNumber::parse(&row.phone_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone number in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            shop: row.shop,
            product_id: row.product_id,
            product_title: row.product_title,
            customer_name: row.customer_name,
            phone_number,
            status: row.status,
            created_at: row.created_at,
            notified_at: row.notified_at,
        })
    }
}

/// Repository for lead database operations.
pub struct LeadRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LeadRepository<'a> {
    /// Create a new lead repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new lead in `pending` state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a pending lead already exists
    /// for the same (shop, product, phone) triple - the partial unique index
    /// backs the same invariant the intake duplicate check enforces.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_lead: &NewLead) -> Result<Lead, RepositoryError> {
        let row = sqlx::query_as::<_, LeadRow>(
            r"
            INSERT INTO lead (shop, product_id, product_title, customer_name, phone_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, shop, product_id, product_title, customer_name,
                      phone_number, status, created_at, notified_at
            ",
        )
        .bind(&new_lead.shop)
        .bind(&new_lead.product_id)
        .bind(&new_lead.product_title)
        .bind(&new_lead.customer_name)
        .bind(new_lead.phone_number.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("pending lead already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Lead::try_from(row)
    }

    /// Get all `pending` leads for a shop and product.
    ///
    /// Returns an empty vector, never an error, when nothing matches.
    /// Ordering is oldest-first, though callers must not rely on it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_pending(
        &self,
        shop: &str,
        product_id: &str,
    ) -> Result<Vec<Lead>, RepositoryError> {
        let rows = sqlx::query_as::<_, LeadRow>(
            r"
            SELECT id, shop, product_id, product_title, customer_name,
                   phone_number, status, created_at, notified_at
            FROM lead
            WHERE shop = $1 AND product_id = $2 AND status = 'pending'
            ORDER BY created_at ASC
            ",
        )
        .bind(shop)
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Lead::try_from).collect()
    }

    /// Check whether a `pending` lead exists for the given triple.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_pending(
        &self,
        shop: &str,
        product_id: &str,
        phone_number: &PhoneNumber,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM lead
                WHERE shop = $1 AND product_id = $2 AND phone_number = $3
                  AND status = 'pending'
            )
            ",
        )
        .bind(shop)
        .bind(product_id)
        .bind(phone_number.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Atomically claim a lead for notification: `pending -> notified`.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// lead was no longer `pending` (already claimed by a concurrent
    /// webhook delivery, or unknown). The conditional update is what makes
    /// duplicate webhook deliveries safe: only one claimant wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn claim(&self, lead_id: LeadId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE lead
            SET status = 'notified', notified_at = now()
            WHERE id = $1 AND status = 'pending'
            ",
        )
        .bind(lead_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Release a claimed lead back to `pending` after a failed send.
    ///
    /// Clears `notified_at` so the lead is indistinguishable from one that
    /// was never attempted, and is selected again by the next restock
    /// event for the same product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn release(&self, lead_id: LeadId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            UPDATE lead
            SET status = 'pending', notified_at = NULL
            WHERE id = $1 AND status = 'notified'
            ",
        )
        .bind(lead_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
