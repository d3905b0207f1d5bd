//! Shopify Admin REST API client.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ShopifyConfig;

/// Webhook topic this app subscribes to.
const PRODUCT_UPDATE_TOPIC: &str = "products/update";

/// Timeout for a single Admin API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when calling the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (transport error or timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Token exchange response did not contain an access token.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// Failed to build the client.
    #[error("client build error: {0}")]
    Build(String),
}

/// Result of a successful OAuth code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub scope: String,
}

/// Shopify Admin REST API client.
///
/// Per-shop state (the access token) is passed into each call rather than
/// held by the client, so one client instance serves every installed shop.
#[derive(Clone)]
pub struct ShopifyClient {
    client: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
    api_version: String,
    base_override: Option<String>,
}

impl ShopifyClient {
    /// Create a new Shopify Admin API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ShopifyConfig) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ShopifyError::Build(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            api_version: config.api_version.clone(),
            base_override: None,
        })
    }

    /// Create a client whose requests go to `base_url` instead of
    /// `https://{shop}`. Used by tests to point at a local mock server.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_base_url(config: &ShopifyConfig, base_url: &str) -> Result<Self, ShopifyError> {
        let mut client = Self::new(config)?;
        client.base_override = Some(base_url.trim_end_matches('/').to_string());
        Ok(client)
    }

    /// The app's OAuth client ID.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn shop_base(&self, shop: &str) -> String {
        self.base_override
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }

    /// Exchange an OAuth authorization code for a permanent access token.
    ///
    /// # Errors
    ///
    /// Returns `TokenExchange` if Shopify answers without a token, `Api`
    /// for non-success statuses, and `Http` on transport failures.
    pub async fn exchange_code(
        &self,
        shop: &str,
        code: &str,
    ) -> Result<AccessTokenGrant, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.shop_base(shop));

        let body = serde_json::json!({
            "client_id": self.api_key,
            "client_secret": self.api_secret.expose_secret(),
            "code": code,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(e.to_string()))?;

        if value.get("access_token").is_none() {
            return Err(ShopifyError::TokenExchange(value.to_string()));
        }

        serde_json::from_value(value).map_err(|e| ShopifyError::Parse(e.to_string()))
    }

    /// Fetch the store's products for the merchant dashboard (first 50).
    ///
    /// Products are passed through as raw JSON; the dashboard renders them
    /// directly and this server adds nothing to the shape.
    ///
    /// # Errors
    ///
    /// Returns `Api` for non-success statuses and `Http` on transport failures.
    pub async fn list_products(
        &self,
        shop: &str,
        access_token: &SecretString,
    ) -> Result<Vec<Value>, ShopifyError> {
        let url = format!(
            "{}/admin/api/{}/products.json",
            self.shop_base(shop),
            self.api_version
        );

        let response = self
            .client
            .get(&url)
            .header("X-Shopify-Access-Token", access_token.expose_secret())
            .query(&[("limit", "50")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ProductListResponse = response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(e.to_string()))?;

        Ok(body.products)
    }

    /// Fetch a product and sum its per-variant inventory.
    ///
    /// Used by the intake pre-check to reject subscriptions for products
    /// that are not actually out of stock. A variant without an
    /// `inventory_quantity` field contributes 0.
    ///
    /// # Errors
    ///
    /// Returns `Api` for non-success statuses and `Http` on transport failures.
    pub async fn total_inventory(
        &self,
        shop: &str,
        access_token: &SecretString,
        product_id: &str,
    ) -> Result<i64, ShopifyError> {
        let url = format!(
            "{}/admin/api/{}/products/{}.json",
            self.shop_base(shop),
            self.api_version,
            product_id
        );

        let response = self
            .client
            .get(&url)
            .header("X-Shopify-Access-Token", access_token.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ShopifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ShopifyError::Parse(e.to_string()))?;

        let total = body
            .get("product")
            .and_then(|p| p.get("variants"))
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

        Ok(total)
    }

    /// Register the `products/update` webhook pointing back at this app.
    ///
    /// Idempotent from the caller's perspective: Shopify answers 422 with
    /// "address ... already taken" when the webhook exists, and that is
    /// treated as success.
    ///
    /// # Errors
    ///
    /// Returns `Api` for other non-success statuses and `Http` on transport
    /// failures.
    pub async fn register_webhook(
        &self,
        shop: &str,
        access_token: &SecretString,
        callback_url: &str,
    ) -> Result<(), ShopifyError> {
        let url = format!(
            "{}/admin/api/{}/webhooks.json",
            self.shop_base(shop),
            self.api_version
        );

        let body = serde_json::json!({
            "webhook": {
                "topic": PRODUCT_UPDATE_TOPIC,
                "address": callback_url,
                "format": "json",
            }
        });

        let response = self
            .client
            .post(&url)
            .header("X-Shopify-Access-Token", access_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();

        // 422 means the webhook address is already registered for the topic.
        if status.as_u16() == 422 && message.contains("taken") {
            tracing::debug!(shop = %shop, "webhook already registered");
            return Ok(());
        }

        Err(ShopifyError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Wrapper for the Admin REST product list response.
#[derive(Debug, Deserialize)]
struct ProductListResponse {
    #[serde(default)]
    products: Vec<Value>,
}
