//! Subscription intake.
//!
//! Validates and accepts a new restock subscription request. The duplicate
//! check, the shop credential check, and (optionally) a live inventory
//! pre-check all run before anything is written; the confirmation message
//! is sent only after the lead is durably stored, and its failure does not
//! roll the subscription back.

use crate::db::{LeadRepository, NewLead, RepositoryError, ShopRepository};
use crate::services::whatsapp::TEMPLATE_SUBSCRIPTION_CONFIRMED;
use crate::state::AppState;

/// Outcome of a subscription request.
///
/// Every variant is a defined, user-visible result - only storage faults
/// surface as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// Lead stored, confirmation send attempted.
    Accepted,
    /// A pending lead already exists for this (shop, product, phone).
    AlreadySubscribed,
    /// No credentials stored for this shop - the app is not installed there.
    UnknownShop,
    /// Inventory pre-check found the product in stock.
    AlreadyInStock,
}

/// Accept or reject a subscription request.
///
/// # Errors
///
/// Returns `RepositoryError` only for storage-layer faults; all defined
/// rejection reasons are [`SubscribeOutcome`] variants.
pub async fn subscribe(
    state: &AppState,
    request: NewLead,
) -> Result<SubscribeOutcome, RepositoryError> {
    let leads = LeadRepository::new(state.pool());
    let shops = ShopRepository::new(state.pool());

    if leads
        .exists_pending(&request.shop, &request.product_id, &request.phone_number)
        .await?
    {
        tracing::info!(
            shop = %request.shop,
            product_id = %request.product_id,
            "duplicate subscription rejected"
        );
        return Ok(SubscribeOutcome::AlreadySubscribed);
    }

    let Some(credentials) = shops.get(&request.shop).await? else {
        tracing::warn!(shop = %request.shop, "subscription for unknown shop rejected");
        return Ok(SubscribeOutcome::UnknownShop);
    };

    // Optional policy: reject subscriptions for products that are not
    // actually out of stock. A failed lookup does not block the
    // subscription - the webhook path is the source of truth anyway.
    if state.config().inventory_precheck {
        match state
            .shopify()
            .total_inventory(&request.shop, &credentials.access_token, &request.product_id)
            .await
        {
            Ok(stock) if stock > 0 => {
                tracing::info!(
                    shop = %request.shop,
                    product_id = %request.product_id,
                    stock,
                    "subscription rejected, product is in stock"
                );
                return Ok(SubscribeOutcome::AlreadyInStock);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    shop = %request.shop,
                    product_id = %request.product_id,
                    error = %e,
                    "inventory pre-check failed, accepting subscription anyway"
                );
            }
        }
    }

    let lead = match leads.create(&request).await {
        Ok(lead) => lead,
        // Lost a race with an identical concurrent request; same outcome as
        // the up-front duplicate check.
        Err(RepositoryError::Conflict(_)) => return Ok(SubscribeOutcome::AlreadySubscribed),
        Err(e) => return Err(e),
    };

    tracing::info!(
        lead_id = %lead.id,
        shop = %lead.shop,
        product_id = %lead.product_id,
        "subscription stored"
    );

    // The lead is already durable; a failed confirmation is logged by the
    // client and deliberately not retried.
    if let Err(e) = state
        .whatsapp()
        .send_template(&lead.phone_number, TEMPLATE_SUBSCRIPTION_CONFIRMED)
        .await
    {
        tracing::warn!(lead_id = %lead.id, error = %e, "confirmation send failed");
    }

    Ok(SubscribeOutcome::Accepted)
}
