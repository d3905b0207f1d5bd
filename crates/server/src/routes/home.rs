//! Embedded-app landing page.

use axum::extract::Query;
use axum::response::{Html, IntoResponse, Redirect};
use serde::Deserialize;

/// Query parameters Shopify appends when opening the embedded app.
#[derive(Debug, Deserialize)]
pub struct LandingQuery {
    pub shop: Option<String>,
}

/// Entry point for the embedded app.
///
/// With a `shop` parameter this shows a simple confirmation page; without
/// one there is nothing sensible to render, so the visitor is sent into
/// the install flow.
pub async fn landing(Query(query): Query<LandingQuery>) -> impl IntoResponse {
    match query.shop {
        Some(shop) => Html(format!(
            r"<html>
    <head><title>Restock Alerts</title></head>
    <body style='font-family: sans-serif; padding: 50px; text-align: center;'>
        <h1>App is running for {shop}</h1>
        <p>Webhooks are active. You can close this tab.</p>
    </body>
</html>"
        ))
        .into_response(),
        None => Redirect::to("/api/auth").into_response(),
    }
}
