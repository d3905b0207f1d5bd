//! WhatsApp Cloud API client for template message dispatch.
//!
//! Sends pre-approved template messages through the Meta Graph API. Only
//! two templates exist: the subscription confirmation and the back-in-stock
//! alert. Template names and the language code are a deployment-time
//! contract with Meta's approved-template registry and must match exactly;
//! a mismatched name fails provider-side with every send.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use restock_alerts_core::PhoneNumber;

use crate::config::WhatsAppConfig;

/// Template sent once when a subscription is accepted.
pub const TEMPLATE_SUBSCRIPTION_CONFIRMED: &str = "subscription_confirmed";

/// Template sent when the product comes back in stock.
pub const TEMPLATE_BACK_IN_STOCK: &str = "item_back_in_stock";

/// Language code all templates are registered under.
const TEMPLATE_LANGUAGE: &str = "en";

/// Timeout for a single send; one slow provider call must not stall a
/// whole webhook batch.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when dispatching a WhatsApp message.
#[derive(Debug, Error)]
pub enum WhatsAppError {
    /// Phone number ID or access token not configured.
    #[error("WhatsApp credentials not configured (WA_PHONE_NUMBER_ID / WA_ACCESS_TOKEN)")]
    MissingCredentials,

    /// HTTP request failed (transport error or timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Graph API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to build the client.
    #[error("client build error: {0}")]
    Build(String),
}

/// WhatsApp Cloud API client.
///
/// Stateless apart from the underlying connection pool; safe to clone and
/// share across handlers. Performs exactly one delivery attempt per call -
/// retry is the caller's policy, not the client's.
#[derive(Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    api_base: String,
    credentials: Option<Credentials>,
}

#[derive(Clone)]
struct Credentials {
    phone_number_id: String,
    access_token: SecretString,
}

/// Graph API error envelope (partial).
#[derive(Debug, Deserialize)]
struct GraphErrorResponse {
    error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

impl WhatsAppClient {
    /// Create a new WhatsApp Cloud API client.
    ///
    /// Missing credentials are not an error here: the client is still
    /// constructed and every send reports [`WhatsAppError::MissingCredentials`].
    /// This lets the server boot and accept subscriptions before the Meta
    /// app review completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, WhatsAppError> {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WhatsAppError::Build(e.to_string()))?;

        let credentials = match (&config.phone_number_id, &config.access_token) {
            (Some(phone_number_id), Some(access_token)) => Some(Credentials {
                phone_number_id: phone_number_id.clone(),
                access_token: access_token.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            credentials,
        })
    }

    /// Send one template message to one recipient.
    ///
    /// The recipient is normalized at send time ([`PhoneNumber::wa_recipient`]);
    /// the stored formatting never reaches the wire. Exactly one attempt is
    /// made; any failure is returned as an error for the caller to log and
    /// act on.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if the client was built without a phone
    /// number ID or token, `Http` on transport failures, and `Api` when the
    /// Graph API answers with a non-success status.
    pub async fn send_template(
        &self,
        phone_number: &PhoneNumber,
        template_name: &str,
    ) -> Result<(), WhatsAppError> {
        let Some(credentials) = &self.credentials else {
            return Err(WhatsAppError::MissingCredentials);
        };

        let recipient = phone_number.wa_recipient();
        let url = format!(
            "{}/{}/messages",
            self.api_base, credentials.phone_number_id
        );

        let body = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": recipient,
            "type": "template",
            "template": {
                "name": template_name,
                "language": { "code": TEMPLATE_LANGUAGE }
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(credentials.access_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GraphErrorResponse>(&text)
                .ok()
                .and_then(|e| e.error)
                .map_or(text, |e| e.message);

            tracing::warn!(
                recipient = %recipient,
                template = template_name,
                status = status.as_u16(),
                error = %message,
                "WhatsApp send rejected by provider"
            );
            return Err(WhatsAppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(
            recipient = %recipient,
            template = template_name,
            status = status.as_u16(),
            "WhatsApp template sent"
        );
        Ok(())
    }
}
