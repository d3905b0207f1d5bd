//! Shopify webhook listener.
//!
//! The `products/update` handler always answers HTTP 200, even on internal
//! failure - the body's `status` field is the only failure signal. Shopify
//! retries (and eventually drops) webhook subscriptions that return error
//! statuses, so a transient database fault must not look like a dead
//! endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Json, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use crate::services::reconciler::{self, StockEvent};
use crate::state::AppState;

/// Header Shopify uses to identify the tenant store.
const SHOP_DOMAIN_HEADER: &str = "X-Shopify-Shop-Domain";

/// Coarse webhook acknowledgment; the caller is a machine, not a human.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

const SUCCESS: Json<WebhookResponse> = Json(WebhookResponse { status: "success" });
const ERROR: Json<WebhookResponse> = Json(WebhookResponse { status: "error" });

/// Handle a `products/update` webhook delivery.
///
/// The raw body is taken as bytes and parsed manually so that malformed
/// payloads still get the 200 acknowledgment.
#[instrument(skip_all)]
pub async fn product_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let shop_domain = headers
        .get(SHOP_DOMAIN_HEADER)
        .and_then(|v| v.to_str().ok());

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "webhook payload is not valid JSON");
            return ERROR;
        }
    };

    let event = match StockEvent::from_webhook(shop_domain, &payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "malformed webhook event");
            return ERROR;
        }
    };

    match reconciler::reconcile(state.pool(), state.whatsapp(), &event).await {
        Ok(summary) => {
            tracing::info!(
                shop = %event.shop,
                product_id = %event.product_id,
                total_stock = event.total_stock,
                matched = summary.matched,
                notified = summary.notified,
                failed = summary.failed,
                already_claimed = summary.already_claimed,
                "webhook processed"
            );
            SUCCESS
        }
        Err(e) => {
            // Ack anyway; the error is ours, not the sender's.
            sentry::capture_error(&e);
            tracing::error!(
                shop = %event.shop,
                product_id = %event.product_id,
                error = %e,
                "webhook reconciliation failed"
            );
            ERROR
        }
    }
}
