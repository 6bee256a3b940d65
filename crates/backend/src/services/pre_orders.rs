//! Pre-orders placed by signed-in customers.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use skydeck_core::{PreOrderId, PreOrderStatus, Price, Uid};
use tracing::{info, instrument};

use crate::error::{Result, ServiceError};
use crate::models::{CustomerProfile, PreOrder, PreOrderItem};
use crate::store::{DocumentStore, Records, Stored};

/// Placeholder for a customer with no profile.
const UNKNOWN_CUSTOMER: &str = "Unknown";

/// Input for [`PreOrderService::create_pre_order`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOrderDraft {
    pub items: Vec<PreOrderItem>,
    pub total_amount: Price,
    /// `YYYY-MM-DD`
    pub pickup_date: String,
    /// `HH:MM`
    pub pickup_time: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// A created pre-order's identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedPreOrder {
    pub id: PreOrderId,
    pub order_number: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusChange {
    status: PreOrderStatus,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cancelled_at: Option<DateTime<Utc>>,
}

/// Pre-order management.
pub struct PreOrderService<'a> {
    orders: Records<'a, PreOrder>,
    customers: Records<'a, CustomerProfile>,
}

impl<'a> PreOrderService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            orders: Records::new(store),
            customers: Records::new(store),
        }
    }

    /// Place a pre-order for `customer_id`.
    ///
    /// The customer's name, email and phone are copied from their profile.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an empty or zero-quantity item list, a
    /// negative total, or a malformed pickup date or time.
    #[instrument(skip(self, draft), fields(customer_id = %customer_id))]
    pub async fn create_pre_order(
        &self,
        customer_id: &Uid,
        draft: PreOrderDraft,
    ) -> Result<PlacedPreOrder> {
        validate(&draft)?;

        let profile = self.customers.get(customer_id).await?.map(|p| p.record);
        let (customer_name, customer_email, customer_phone) = profile.map_or_else(
            || {
                (
                    UNKNOWN_CUSTOMER.to_owned(),
                    UNKNOWN_CUSTOMER.to_owned(),
                    String::new(),
                )
            },
            |p| (p.full_name, p.email.into_inner(), p.phone_number),
        );

        let now = Utc::now();
        let order_number = format!("PRE-{}", now.timestamp_millis());
        let id = self
            .orders
            .create(&PreOrder {
                customer_id: customer_id.clone(),
                customer_name,
                customer_email,
                customer_phone,
                items: draft.items,
                total_amount: draft.total_amount,
                pickup_date: draft.pickup_date,
                pickup_time: draft.pickup_time,
                special_instructions: draft
                    .special_instructions
                    .filter(|s| !s.trim().is_empty()),
                order_number: order_number.clone(),
                status: PreOrderStatus::Pending,
                created_at: now,
                updated_at: now,
                cancelled_at: None,
            })
            .await?;

        info!(pre_order_id = %id, %order_number, "Pre-order placed");
        Ok(PlacedPreOrder { id, order_number })
    }

    /// A customer's pre-orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn list_customer_pre_orders(
        &self,
        customer_id: &Uid,
    ) -> Result<Vec<Stored<PreOrder>>> {
        let mut orders: Vec<_> = self
            .orders
            .list()
            .await?
            .into_iter()
            .filter(|o| &o.record.customer_id == customer_id)
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    /// Every pre-order, newest first.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn list_all_pre_orders(&self) -> Result<Vec<Stored<PreOrder>>> {
        let mut orders = self.orders.list().await?;
        newest_first(&mut orders);
        Ok(orders)
    }

    /// Move a pre-order to `status`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    #[instrument(skip(self), fields(pre_order_id = %id))]
    pub async fn update_pre_order_status(
        &self,
        id: &PreOrderId,
        status: PreOrderStatus,
    ) -> Result<()> {
        let now = Utc::now();
        let change = StatusChange {
            status,
            updated_at: now,
            cancelled_at: (status == PreOrderStatus::Cancelled).then_some(now),
        };
        self.orders.update(id, &change).await?;
        info!(%status, "Pre-order status updated");
        Ok(())
    }

    /// Cancel a pre-order that hasn't been completed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id and `Validation` when the order is
    /// already completed or cancelled.
    pub async fn cancel_pre_order(&self, id: &PreOrderId) -> Result<()> {
        let current = self.orders.require(id).await?;
        if current.record.status.is_final() {
            return Err(ServiceError::validation(format!(
                "pre-order {} is already {}",
                current.record.order_number, current.record.status
            )));
        }
        self.update_pre_order_status(id, PreOrderStatus::Cancelled).await
    }
}

fn validate(draft: &PreOrderDraft) -> Result<()> {
    if draft.items.is_empty() {
        return Err(ServiceError::validation("pre-order has no items"));
    }
    if let Some(item) = draft.items.iter().find(|i| i.quantity == 0) {
        return Err(ServiceError::validation(format!(
            "quantity of {} must be at least 1",
            item.name
        )));
    }
    if draft.total_amount.is_negative() {
        return Err(ServiceError::validation("total amount cannot be negative"));
    }
    NaiveDate::parse_from_str(&draft.pickup_date, "%Y-%m-%d")
        .map_err(|_| ServiceError::validation("pickup date must be YYYY-MM-DD"))?;
    NaiveTime::parse_from_str(&draft.pickup_time, "%H:%M")
        .map_err(|_| ServiceError::validation("pickup time must be HH:MM"))?;
    Ok(())
}

fn newest_first(orders: &mut [Stored<PreOrder>]) {
    orders.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skydeck_core::{Email, ErrorKind};

    use super::*;
    use crate::store::InMemoryStore;

    fn draft() -> PreOrderDraft {
        PreOrderDraft {
            items: vec![PreOrderItem {
                id: "m1".to_owned(),
                name: "Sky Deck Latte".to_owned(),
                price: Price::from_cents(625),
                quantity: 2,
                category: "coffee".to_owned(),
            }],
            total_amount: Price::from_cents(1250),
            pickup_date: "2026-10-20".to_owned(),
            pickup_time: "08:30".to_owned(),
            special_instructions: Some("Oat milk please".to_owned()),
        }
    }

    async fn add_customer(store: &InMemoryStore, uid: &Uid) {
        Records::<CustomerProfile>::new(store)
            .put(
                uid,
                &CustomerProfile {
                    full_name: "Ana Reyes".to_owned(),
                    email: Email::parse("ana@example.ph").unwrap(),
                    phone_number: "+63 917 000 0000".to_owned(),
                    photo_url: None,
                    role: None,
                    is_active: true,
                    email_verified: true,
                    created_at: Utc::now(),
                    updated_at: None,
                    deleted_at: None,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_snapshots_profile() {
        let store = InMemoryStore::new();
        let uid = Uid::new("ana");
        add_customer(&store, &uid).await;

        let placed = PreOrderService::new(&store)
            .create_pre_order(&uid, draft())
            .await
            .unwrap();
        assert!(placed.order_number.starts_with("PRE-"));

        let stored = Records::<PreOrder>::new(&store)
            .require(&placed.id)
            .await
            .unwrap()
            .record;
        assert_eq!(stored.customer_name, "Ana Reyes");
        assert_eq!(stored.customer_email, "ana@example.ph");
        assert_eq!(stored.status, PreOrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_without_profile_uses_unknown() {
        let store = InMemoryStore::new();
        let placed = PreOrderService::new(&store)
            .create_pre_order(&Uid::new("ghost"), draft())
            .await
            .unwrap();

        let stored = Records::<PreOrder>::new(&store)
            .require(&placed.id)
            .await
            .unwrap()
            .record;
        assert_eq!(stored.customer_name, "Unknown");
        assert_eq!(stored.customer_email, "Unknown");
        assert_eq!(stored.customer_phone, "");
    }

    #[tokio::test]
    async fn test_bad_pickup_time_rejected() {
        let store = InMemoryStore::new();
        let mut bad = draft();
        bad.pickup_time = "half past eight".to_owned();
        let err = PreOrderService::new(&store)
            .create_pre_order(&Uid::new("ana"), bad)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.count("preorders"), 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_customer() {
        let store = InMemoryStore::new();
        let service = PreOrderService::new(&store);
        service.create_pre_order(&Uid::new("ana"), draft()).await.unwrap();
        service.create_pre_order(&Uid::new("ben"), draft()).await.unwrap();

        let mine = service
            .list_customer_pre_orders(&Uid::new("ana"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(service.list_all_pre_orders().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_sets_cancelled_at() {
        let store = InMemoryStore::new();
        let service = PreOrderService::new(&store);
        let placed = service.create_pre_order(&Uid::new("ana"), draft()).await.unwrap();

        service.cancel_pre_order(&placed.id).await.unwrap();
        let stored = Records::<PreOrder>::new(&store)
            .require(&placed.id)
            .await
            .unwrap()
            .record;
        assert_eq!(stored.status, PreOrderStatus::Cancelled);
        assert!(stored.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_cannot_cancel_completed() {
        let store = InMemoryStore::new();
        let service = PreOrderService::new(&store);
        let placed = service.create_pre_order(&Uid::new("ana"), draft()).await.unwrap();
        service
            .update_pre_order_status(&placed.id, PreOrderStatus::Completed)
            .await
            .unwrap();

        let err = service.cancel_pre_order(&placed.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
