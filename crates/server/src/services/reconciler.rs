//! Restock reconciliation.
//!
//! A `products/update` webhook is distilled into a [`StockEvent`]; when the
//! event shows positive stock, every pending lead for that shop + product
//! gets one delivery attempt. Leads are claimed (`pending -> notified`)
//! *before* the send and released back to `pending` if the send fails, so
//! two concurrent deliveries of the same webhook cannot double-message a
//! customer: the conditional claim admits exactly one winner per lead.

use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;

use crate::db::{LeadRepository, RepositoryError};
use crate::services::whatsapp::{TEMPLATE_BACK_IN_STOCK, WhatsAppClient};

/// Errors distilling a webhook payload into a [`StockEvent`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockEventError {
    /// The `X-Shopify-Shop-Domain` header was absent or empty.
    #[error("missing shop domain header")]
    MissingShopDomain,
    /// The payload has no usable `id` field.
    #[error("payload has no product id")]
    MissingProductId,
}

/// The distilled form of a product-update webhook. Ephemeral: exists only
/// for the duration of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockEvent {
    /// Tenant shop domain, from the webhook header.
    pub shop: String,
    /// Product ID in canonical string form.
    pub product_id: String,
    /// Sum of `inventory_quantity` across all variants in the payload.
    pub total_stock: i64,
}

impl StockEvent {
    /// Distill a webhook payload into a `StockEvent`.
    ///
    /// The payload `id` arrives as a JSON number but leads store product
    /// IDs as strings, so the ID is canonicalized here - numeric and
    /// string forms of the same ID must compare equal on the read path. A
    /// variant with a missing or non-numeric `inventory_quantity`
    /// contributes 0.
    ///
    /// # Errors
    ///
    /// Returns an error when the shop domain or the product id is absent;
    /// either makes the event unprocessable.
    pub fn from_webhook(
        shop_domain: Option<&str>,
        payload: &Value,
    ) -> Result<Self, StockEventError> {
        let shop = shop_domain
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(StockEventError::MissingShopDomain)?;

        let product_id = match payload.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => return Err(StockEventError::MissingProductId),
        };

        let total_stock = payload
            .get("variants")
            .and_then(Value::as_array)
            .map_or(0, |variants| {
                variants
                    .iter()
                    .map(|v| {
                        v.get("inventory_quantity")
                            .and_then(Value::as_i64)
                            .unwrap_or(0)
                    })
                    .sum()
            });

        Ok(Self {
            shop: shop.to_owned(),
            product_id,
            total_stock,
        })
    }
}

/// Counters from one reconciliation pass, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Pending leads selected for this shop + product.
    pub matched: usize,
    /// Leads notified and committed as `notified`.
    pub notified: usize,
    /// Leads whose send failed; released back to `pending`.
    pub failed: usize,
    /// Leads another webhook delivery claimed first.
    pub already_claimed: usize,
}

/// Run one reconciliation pass for a stock event.
///
/// Zero or negative stock is a successful no-op. Leads are processed
/// sequentially and failures are isolated per lead: one provider rejection
/// is logged, the lead is released, and the loop continues.
///
/// # Errors
///
/// Returns `RepositoryError` only for storage-layer faults; provider
/// failures never abort the pass.
pub async fn reconcile(
    pool: &PgPool,
    whatsapp: &WhatsAppClient,
    event: &StockEvent,
) -> Result<ReconcileSummary, RepositoryError> {
    let mut summary = ReconcileSummary::default();

    if event.total_stock <= 0 {
        tracing::debug!(
            shop = %event.shop,
            product_id = %event.product_id,
            "stock update received, but total quantity is still 0"
        );
        return Ok(summary);
    }

    let leads = LeadRepository::new(pool);
    let pending = leads.find_pending(&event.shop, &event.product_id).await?;
    summary.matched = pending.len();

    tracing::info!(
        shop = %event.shop,
        product_id = %event.product_id,
        total_stock = event.total_stock,
        matched = summary.matched,
        "reconciling pending leads"
    );

    for lead in pending {
        // Claim first so a concurrent delivery of the same event skips
        // this lead instead of sending a second message.
        if !leads.claim(lead.id).await? {
            summary.already_claimed += 1;
            continue;
        }

        match whatsapp
            .send_template(&lead.phone_number, TEMPLATE_BACK_IN_STOCK)
            .await
        {
            Ok(()) => {
                summary.notified += 1;
                tracing::info!(lead_id = %lead.id, "lead notified");
            }
            Err(e) => {
                // One attempt per event; the lead goes back to pending and
                // rides the next restock webhook.
                tracing::warn!(lead_id = %lead.id, error = %e, "send failed, releasing lead");
                if let Err(release_err) = leads.release(lead.id).await {
                    // The lead stays claimed with no message delivered;
                    // that needs operator attention, but the rest of the
                    // batch must still get its delivery attempts.
                    sentry::capture_error(&release_err);
                    tracing::error!(
                        lead_id = %lead.id,
                        error = %release_err,
                        "release after failed send also failed, lead stuck in notified"
                    );
                }
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}
