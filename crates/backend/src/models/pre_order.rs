//! Pre-orders placed by signed-in customers for later pickup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skydeck_core::{PreOrderId, PreOrderStatus, Price, Uid};

use crate::store::Record;

/// A line on a pre-order, copied from the menu at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOrderItem {
    pub id: String,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default)]
    pub category: String,
}

/// A pre-order (`preorders`).
///
/// Customer fields are a snapshot of the profile when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOrder {
    pub customer_id: Uid,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: String,
    pub items: Vec<PreOrderItem>,
    pub total_amount: Price,
    /// `YYYY-MM-DD`
    pub pickup_date: String,
    /// `HH:MM`
    pub pickup_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    pub order_number: String,
    #[serde(default)]
    pub status: PreOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Record for PreOrder {
    const COLLECTION: &'static str = "preorders";
    type Id = PreOrderId;
}
