//! Subscription route handler.
//!
//! Accepts a restock subscription from the storefront widget and maps each
//! intake outcome to a distinct, user-visible response message.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use restock_alerts_core::PhoneNumber;

use crate::db::NewLead;
use crate::error::AppError;
use crate::services::intake::{self, SubscribeOutcome};
use crate::state::AppState;

/// Subscription request body.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub shop: String,
    /// Accepted as either a JSON string or number; stored canonically as a
    /// string so webhook payloads (numeric IDs) match at lookup time.
    pub product_id: ProductIdField,
    pub product_title: String,
    pub customer_name: String,
    pub phone_number: String,
}

/// A product ID that may arrive as a string or a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ProductIdField {
    Text(String),
    Number(i64),
}

impl ProductIdField {
    /// Canonical string form, matching what the webhook path derives.
    #[must_use]
    pub fn into_canonical(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Subscription response body.
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Register a new restock subscription.
#[instrument(skip(state, request), fields(shop = %request.shop))]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, AppError> {
    let shop = request.shop.trim().to_owned();
    if shop.is_empty() {
        return Err(AppError::BadRequest("shop must not be empty".to_owned()));
    }

    let product_id = request.product_id.into_canonical();
    if product_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "product_id must not be empty".to_owned(),
        ));
    }

    let phone_number = PhoneNumber::parse(&request.phone_number)
        .map_err(|e| AppError::BadRequest(format!("invalid phone number: {e}")))?;

    let outcome = intake::subscribe(
        &state,
        NewLead {
            shop,
            product_id,
            product_title: request.product_title,
            customer_name: request.customer_name,
            phone_number,
        },
    )
    .await?;

    let response = match outcome {
        SubscribeOutcome::Accepted => SubscribeResponse {
            status: "success",
            message: "Subscription successful!",
        },
        SubscribeOutcome::AlreadySubscribed => SubscribeResponse {
            status: "already_subscribed",
            message: "You are already on the waitlist!",
        },
        SubscribeOutcome::UnknownShop => SubscribeResponse {
            status: "error",
            message: "Store not found.",
        },
        SubscribeOutcome::AlreadyInStock => SubscribeResponse {
            status: "error",
            message: "This product is already in stock.",
        },
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_accepts_string_and_number() {
        let from_string: ProductIdField =
            serde_json::from_str("\"8675309\"").expect("string form");
        let from_number: ProductIdField = serde_json::from_str("8675309").expect("number form");

        assert_eq!(from_string.into_canonical(), "8675309");
        assert_eq!(from_number.into_canonical(), "8675309");
    }

    #[test]
    fn test_request_deserializes_with_numeric_product_id() {
        let json = r#"{
            "shop": "acme.myshopify.com",
            "product_id": 42,
            "product_title": "Widget",
            "customer_name": "Jo",
            "phone_number": "+1 555 0100"
        }"#;
        let request: SubscribeRequest = serde_json::from_str(json).expect("request");
        assert_eq!(request.product_id.into_canonical(), "42");
    }
}
