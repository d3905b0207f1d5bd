//! Merchant dashboard product proxy.
//!
//! The dashboard has no Shopify credentials of its own, so this route
//! proxies the store's product list using the token saved at install time.
//! Every failure mode degrades to an empty list - a broken dashboard call
//! must never surface provider errors to the merchant's browser.

use axum::{Json, extract::Query, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::db::ShopRepository;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub shop: Option<String>,
}

/// Product listing response; products are raw Shopify JSON.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<Value>,
}

/// Fetch store products for the merchant dashboard.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Json<ProductsResponse> {
    let empty = Json(ProductsResponse { products: vec![] });

    let Some(shop) = query.shop.filter(|s| !s.trim().is_empty()) else {
        return empty;
    };

    let credentials = match ShopRepository::new(state.pool()).get(&shop).await {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            tracing::debug!(shop = %shop, "product list requested for unknown shop");
            return empty;
        }
        Err(e) => {
            tracing::error!(shop = %shop, error = %e, "shop lookup failed");
            return empty;
        }
    };

    match state
        .shopify()
        .list_products(&shop, &credentials.access_token)
        .await
    {
        Ok(products) => Json(ProductsResponse { products }),
        Err(e) => {
            tracing::warn!(shop = %shop, error = %e, "product list fetch failed");
            empty
        }
    }
}
