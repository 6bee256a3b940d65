//! Records written by the public site's forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skydeck_core::{
    Email, OrderId, OrderStatus, Price, SubmissionId, SubmissionStatus, SubscriptionId,
    SubscriptionStatus,
};

use crate::store::Record;

/// A message sent through the contact form (`contact_submissions`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: SubmissionStatus,
}

impl Record for ContactSubmission {
    const COLLECTION: &'static str = "contact_submissions";
    type Id = SubmissionId;
}

/// A line on a web order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

impl OrderItem {
    /// Price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// An order placed through the public order form (`orders`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub customer_name: String,
    pub customer_email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Record for Order {
    const COLLECTION: &'static str = "orders";
    type Id = OrderId;
}

/// A newsletter sign-up (`newsletter_subscriptions`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscription {
    pub email: Email,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: SubscriptionStatus,
}

impl Record for NewsletterSubscription {
    const COLLECTION: &'static str = "newsletter_subscriptions";
    type Id = SubscriptionId;
}
