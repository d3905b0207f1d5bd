//! Shopify OAuth install flow.
//!
//! Two thin handlers: `/api/auth` bounces the merchant out of the Shopify
//! iframe to the authorize page, and `/api/auth/callback` exchanges the
//! temporary code for a permanent token, stores it, and self-registers the
//! `products/update` webhook so no manual setup is needed. Failures in the
//! callback are logged and the merchant is redirected to the admin page
//! regardless - a broken install is retried by reinstalling, not by
//! showing an error page.

use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ShopRepository;
use crate::state::AppState;

/// Scopes requested at install; `read_inventory` is needed to track stock
/// levels via webhooks.
const OAUTH_SCOPES: &str = "read_products,write_products,read_inventory";

/// Query parameters for the install entry point.
#[derive(Debug, Deserialize)]
pub struct InstallQuery {
    pub shop: Option<String>,
}

/// Query parameters Shopify sends to the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub shop: String,
    pub code: String,
}

/// Entry point for the Shopify app installation.
///
/// Renders a tiny page that escapes the Shopify iframe via
/// `window.top.location`, otherwise the merchant never sees the
/// grant-permissions screen.
#[instrument(skip(state))]
pub async fn install(
    State(state): State<AppState>,
    Query(query): Query<InstallQuery>,
) -> impl IntoResponse {
    let Some(shop) = query.shop.filter(|s| !s.trim().is_empty()) else {
        return Html("Missing shop parameter.".to_owned()).into_response();
    };

    let shop = normalize_shop_domain(shop.trim());
    let config = state.config();
    let redirect_uri = format!("{}/api/auth/callback", config.base_url);
    let install_url = format!(
        "https://{shop}/admin/oauth/authorize?client_id={}&scope={OAUTH_SCOPES}&redirect_uri={}",
        config.shopify.api_key,
        urlencode(&redirect_uri),
    );

    Html(format!(
        r#"<html>
    <head>
        <script type="text/javascript">
            window.top.location.href = "{install_url}";
        </script>
    </head>
    <body>
        <h2 style="text-align:center; padding-top:100px;">Redirecting to Shopify...</h2>
    </body>
</html>"#
    ))
    .into_response()
}

/// Final step of OAuth: exchange the temporary code for a permanent access
/// token, persist it, and register the stock-change webhook.
#[instrument(skip(state, query), fields(shop = %query.shop))]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let shop = query.shop.trim().to_owned();

    match state.shopify().exchange_code(&shop, &query.code).await {
        Ok(grant) => {
            let shops = ShopRepository::new(state.pool());
            match shops.upsert(&shop, &grant.access_token, &grant.scope).await {
                Ok(()) => {
                    tracing::info!(shop = %shop, "access token stored");
                    register_webhook(&state, &shop).await;
                }
                Err(e) => {
                    sentry::capture_error(&e);
                    tracing::error!(shop = %shop, error = %e, "failed to store access token");
                }
            }
        }
        Err(e) => {
            tracing::error!(shop = %shop, error = %e, "token exchange failed");
        }
    }

    // Back to the Shopify admin app dashboard either way.
    let store_name = shop.split('.').next().unwrap_or(&shop);
    Redirect::to(&format!(
        "https://admin.shopify.com/store/{store_name}/apps/{}",
        state.shopify().api_key()
    ))
}

/// Register the `products/update` webhook for a freshly installed shop.
async fn register_webhook(state: &AppState, shop: &str) {
    let credentials = match ShopRepository::new(state.pool()).get(shop).await {
        Ok(Some(credentials)) => credentials,
        Ok(None) => {
            tracing::error!(shop = %shop, "credentials missing right after install");
            return;
        }
        Err(e) => {
            tracing::error!(shop = %shop, error = %e, "credential lookup failed");
            return;
        }
    };

    let callback_url = format!("{}/api/webhooks/product_update", state.config().base_url);
    match state
        .shopify()
        .register_webhook(shop, &credentials.access_token, &callback_url)
        .await
    {
        Ok(()) => {
            tracing::info!(shop = %shop, callback_url = %callback_url, "webhook registered");
        }
        Err(e) => tracing::error!(shop = %shop, error = %e, "webhook registration failed"),
    }
}

/// Accept bare store names ("acme") as well as full domains.
fn normalize_shop_domain(shop: &str) -> String {
    if shop.contains('.') {
        shop.to_owned()
    } else {
        format!("{shop}.myshopify.com")
    }
}

/// Minimal percent-encoding for the redirect URI query value.
fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
