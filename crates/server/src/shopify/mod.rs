//! Shopify Admin REST API integration.
//!
//! Covers the three things the app needs from Shopify: the OAuth token
//! exchange during install, webhook self-registration, and product reads
//! (dashboard listing and the optional inventory pre-check).

pub mod client;

pub use client::{AccessTokenGrant, ShopifyClient, ShopifyError};
