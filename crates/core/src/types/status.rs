//! Lead lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a stored subscription lead.
///
/// The only legal transition is `Pending -> Notified`, made when a restock
/// alert has been delivered. `Notified` is terminal; a failed delivery
/// leaves the lead `Pending` so a later restock event can pick it up again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "lead_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Waiting for the product to come back in stock.
    #[default]
    Pending,
    /// A back-in-stock alert was delivered for this lead.
    Notified,
}

impl LeadStatus {
    /// Returns the wire/database representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Notified => "notified",
        }
    }
}
