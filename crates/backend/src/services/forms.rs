//! Public site forms: contact, web order, newsletter.

use chrono::Utc;
use serde::Deserialize;
use skydeck_core::{
    Email, OrderId, OrderStatus, Price, SubmissionId, SubmissionStatus, SubscriptionId,
    SubscriptionStatus,
};
use tracing::{info, instrument};

use crate::error::{Result, ServiceError};
use crate::models::{ContactSubmission, NewsletterSubscription, Order, OrderItem};
use crate::store::{DocumentStore, Records, Stored};

/// Contact form input.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
}

/// Web order input.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
}

/// Writes form submissions.
pub struct FormsService<'a> {
    contacts: Records<'a, ContactSubmission>,
    orders: Records<'a, Order>,
    subscriptions: Records<'a, NewsletterSubscription>,
}

impl<'a> FormsService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            contacts: Records::new(store),
            orders: Records::new(store),
            subscriptions: Records::new(store),
        }
    }

    /// Store a contact message with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank name or message, or a bad email.
    #[instrument(skip(self, form))]
    pub async fn submit_contact_form(&self, form: ContactForm) -> Result<SubmissionId> {
        let name = required("name", &form.name)?;
        let email = parse_email(&form.email)?;
        let message = required("message", &form.message)?;

        let id = self
            .contacts
            .create(&ContactSubmission {
                name,
                email,
                phone: non_blank(form.phone),
                message,
                timestamp: Utc::now(),
                status: SubmissionStatus::New,
            })
            .await?;
        info!(submission_id = %id, "Contact form submitted");
        Ok(id)
    }

    /// Store a web order with status `pending`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing customer details, an empty or
    /// zero-quantity item list, or a negative total.
    #[instrument(skip(self, form), fields(items = form.items.len()))]
    pub async fn submit_order(&self, form: OrderForm) -> Result<OrderId> {
        let customer_name = required("customer name", &form.customer_name)?;
        let customer_email = parse_email(&form.customer_email)?;
        if form.items.is_empty() {
            return Err(ServiceError::validation("order has no items"));
        }
        if let Some(item) = form.items.iter().find(|i| i.quantity == 0) {
            return Err(ServiceError::validation(format!(
                "quantity of {} must be at least 1",
                item.name
            )));
        }
        if form.total_amount.is_negative() {
            return Err(ServiceError::validation("total amount cannot be negative"));
        }

        let id = self
            .orders
            .create(&Order {
                customer_name,
                customer_email,
                customer_phone: non_blank(form.customer_phone),
                items: form.items,
                total_amount: form.total_amount,
                timestamp: Utc::now(),
                status: OrderStatus::Pending,
            })
            .await?;
        info!(order_id = %id, total = %form.total_amount, "Order submitted");
        Ok(id)
    }

    /// Store a newsletter sign-up with status `active`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad email.
    #[instrument(skip(self, email))]
    pub async fn subscribe_newsletter(&self, email: &str) -> Result<SubscriptionId> {
        let email = parse_email(email)?;
        let id = self
            .subscriptions
            .create(&NewsletterSubscription {
                email,
                timestamp: Utc::now(),
                status: SubscriptionStatus::Active,
            })
            .await?;
        info!(subscription_id = %id, "Newsletter subscription added");
        Ok(id)
    }

    /// Contact messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn list_contact_submissions(&self) -> Result<Vec<Stored<ContactSubmission>>> {
        let mut submissions = self.contacts.list().await?;
        submissions.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));
        Ok(submissions)
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(value.to_owned())
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| ServiceError::validation(format!("invalid email: {e}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skydeck_core::ErrorKind;

    use super::*;
    use crate::store::InMemoryStore;

    fn item(quantity: u32) -> OrderItem {
        OrderItem {
            id: "1".to_owned(),
            name: "Spanish Latte".to_owned(),
            price: Price::from_cents(16_000),
            quantity,
        }
    }

    fn order(items: Vec<OrderItem>) -> OrderForm {
        let total = items.iter().map(OrderItem::line_total).sum();
        OrderForm {
            customer_name: "Ana Reyes".to_owned(),
            customer_email: "ana@example.ph".to_owned(),
            customer_phone: Some("  ".to_owned()),
            items,
            total_amount: total,
        }
    }

    #[tokio::test]
    async fn test_contact_form_stored_as_new() {
        let store = InMemoryStore::new();
        let forms = FormsService::new(&store);
        forms
            .submit_contact_form(ContactForm {
                name: "Ana".to_owned(),
                email: "ana@example.ph".to_owned(),
                phone: None,
                message: "Do you take reservations?".to_owned(),
            })
            .await
            .unwrap();

        let submissions = forms.list_contact_submissions().await.unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].record.status, SubmissionStatus::New);
    }

    #[tokio::test]
    async fn test_contact_form_bad_email_writes_nothing() {
        let store = InMemoryStore::new();
        let err = FormsService::new(&store)
            .submit_contact_form(ContactForm {
                name: "Ana".to_owned(),
                email: "ana-at-example".to_owned(),
                phone: None,
                message: "Hello".to_owned(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.count("contact_submissions"), 0);
    }

    #[tokio::test]
    async fn test_order_pending_with_blank_phone_dropped() {
        let store = InMemoryStore::new();
        let id = FormsService::new(&store)
            .submit_order(order(vec![item(2)]))
            .await
            .unwrap();

        let stored = Records::<Order>::new(&store).require(&id).await.unwrap();
        assert_eq!(stored.record.status, OrderStatus::Pending);
        assert_eq!(stored.record.customer_phone, None);
        assert_eq!(stored.record.total_amount, Price::from_cents(32_000));
    }

    #[tokio::test]
    async fn test_order_validation() {
        let store = InMemoryStore::new();
        let forms = FormsService::new(&store);

        let empty = forms.submit_order(order(vec![])).await.unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::Validation);

        let zero = forms.submit_order(order(vec![item(0)])).await.unwrap_err();
        assert_eq!(zero.kind(), ErrorKind::Validation);

        let mut negative = order(vec![item(1)]);
        negative.total_amount = Price::from_cents(-1);
        let err = forms.submit_order(negative).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(store.count("orders"), 0);
    }

    #[tokio::test]
    async fn test_newsletter_subscription_active() {
        let store = InMemoryStore::new();
        let id = FormsService::new(&store)
            .subscribe_newsletter("  beans@example.ph ")
            .await
            .unwrap();

        let stored = Records::<NewsletterSubscription>::new(&store)
            .require(&id)
            .await
            .unwrap();
        assert_eq!(stored.record.status, SubscriptionStatus::Active);
        assert_eq!(stored.record.email.as_str(), "beans@example.ph");
    }
}
