//! Business logic services.
//!
//! - [`intake`] - Accepts new restock subscriptions
//! - [`reconciler`] - Matches stock-change webhooks against pending leads
//! - [`whatsapp`] - WhatsApp Cloud API template dispatch

pub mod intake;
pub mod reconciler;
pub mod whatsapp;

pub use intake::SubscribeOutcome;
pub use reconciler::{ReconcileSummary, StockEvent};
pub use whatsapp::{WhatsAppClient, WhatsAppError};
