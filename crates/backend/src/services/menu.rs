//! Menu board management.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use skydeck_core::{MenuItemId, Price};
use tracing::{info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::models::{MenuItem, MenuItemPatch, Touched};
use crate::store::{DocumentStore, Records, Stored};

/// Input for [`MenuService::add_menu_item`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "crate::models::default_true")]
    pub available: bool,
}

/// Outcome of [`MenuService::seed_menu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub success_count: usize,
    pub error_count: usize,
    pub total: usize,
}

/// Menu item management.
pub struct MenuService<'a> {
    items: Records<'a, MenuItem>,
}

impl<'a> MenuService<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            items: Records::new(store),
        }
    }

    /// Every menu item, by category then name.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection can't be read.
    pub async fn list_menu(&self) -> Result<Vec<Stored<MenuItem>>> {
        let mut items = self.items.list().await?;
        items.sort_by(|a, b| {
            a.record
                .category
                .cmp(&b.record.category)
                .then_with(|| a.record.name.cmp(&b.record.name))
        });
        Ok(items)
    }

    /// # Errors
    ///
    /// Returns `Validation` for a blank name or category or a negative price.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add_menu_item(&self, draft: MenuItemDraft) -> Result<MenuItemId> {
        validate(&draft)?;
        let id = self
            .items
            .create(&MenuItem {
                name: draft.name.trim().to_owned(),
                description: draft.description,
                price: draft.price,
                category: draft.category.trim().to_owned(),
                image_url: draft.image_url,
                available: draft.available,
                created_at: Some(Utc::now()),
                updated_at: None,
            })
            .await?;
        info!(menu_item_id = %id, "Menu item added");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, `Validation` for a negative price.
    #[instrument(skip(self, patch), fields(menu_item_id = %id))]
    pub async fn update_menu_item(&self, id: &MenuItemId, patch: &MenuItemPatch) -> Result<()> {
        if patch.price.is_some_and(|p| p.is_negative()) {
            return Err(ServiceError::validation("price cannot be negative"));
        }
        self.items.update(id, &Touched::now(patch)).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a store error if the delete fails.
    #[instrument(skip(self), fields(menu_item_id = %id))]
    pub async fn delete_menu_item(&self, id: &MenuItemId) -> Result<()> {
        self.items.delete(id).await?;
        info!("Menu item deleted");
        Ok(())
    }

    /// Insert the house menu. A failed item is counted and skipped.
    pub async fn seed_menu(&self) -> SeedReport {
        self.seed(house_menu()).await
    }

    /// Insert `drafts`, counting failures instead of stopping at them.
    pub async fn seed(&self, drafts: Vec<MenuItemDraft>) -> SeedReport {
        let total = drafts.len();
        let mut success_count = 0;
        let mut error_count = 0;

        for draft in drafts {
            let name = draft.name.clone();
            match self.add_menu_item(draft).await {
                Ok(_) => success_count += 1,
                Err(e) => {
                    error_count += 1;
                    warn!(item = %name, error = %e, "Failed to seed menu item");
                }
            }
        }

        info!(success_count, error_count, total, "Menu seeding complete");
        SeedReport {
            success_count,
            error_count,
            total,
        }
    }
}

fn validate(draft: &MenuItemDraft) -> Result<()> {
    if draft.name.trim().is_empty() {
        return Err(ServiceError::validation("name is required"));
    }
    if draft.category.trim().is_empty() {
        return Err(ServiceError::validation("category is required"));
    }
    if draft.price.is_negative() {
        return Err(ServiceError::validation("price cannot be negative"));
    }
    Ok(())
}

fn item(name: &str, description: &str, cents: i64, category: &str, image: &str) -> MenuItemDraft {
    MenuItemDraft {
        name: name.to_owned(),
        description: description.to_owned(),
        price: Price::from_cents(cents),
        category: category.to_owned(),
        image_url: format!("https://images.unsplash.com/{image}?w=400"),
        available: true,
    }
}

/// The menu the shop opened with.
#[must_use]
pub fn house_menu() -> Vec<MenuItemDraft> {
    vec![
        item(
            "Signature Espresso",
            "Rich, bold espresso shot from our premium house blend",
            450,
            "coffee",
            "photo-1497515114629-f71d768fd07c",
        ),
        item(
            "Sky Deck Latte",
            "Smooth espresso with steamed milk and our signature foam art",
            625,
            "coffee",
            "photo-1572442388796-11668a67e53d",
        ),
        item(
            "Cappuccino Supreme",
            "Traditional cappuccino with perfectly balanced milk foam",
            575,
            "coffee",
            "photo-1461023058943-07fcbe16d735",
        ),
        item(
            "Iced Golden Latte",
            "Cold brew with turmeric, ginger, and coconut milk",
            700,
            "drinks",
            "photo-1544787219-7f47ccb76574",
        ),
        item(
            "Matcha Cloud",
            "Premium matcha powder with steamed oat milk",
            650,
            "drinks",
            "photo-1515823064-d6e0c04616a7",
        ),
        item(
            "Chocolate Croissant",
            "Buttery, flaky croissant filled with rich dark chocolate",
            425,
            "pastry",
            "photo-1555507036-ab794f6eb9f3",
        ),
        item(
            "Blueberry Muffin",
            "Fresh baked muffin bursting with juicy blueberries",
            375,
            "pastry",
            "photo-1558961363-fa8fdf82db35",
        ),
        item(
            "Avocado Toast",
            "Multigrain bread topped with fresh avocado and herbs",
            850,
            "food",
            "photo-1541519920360-d25eedec68eb",
        ),
        item(
            "Breakfast Sandwich",
            "Egg, cheese, and bacon on a toasted English muffin",
            925,
            "food",
            "photo-1582196016295-f8c8bd4b3a99",
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skydeck_core::ErrorKind;

    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn test_seed_menu_adds_house_items() {
        let store = InMemoryStore::new();
        let report = MenuService::new(&store).seed_menu().await;
        assert_eq!(
            report,
            SeedReport {
                success_count: 9,
                error_count: 0,
                total: 9
            }
        );
        assert_eq!(store.count("menu_items"), 9);
    }

    #[tokio::test]
    async fn test_seed_counts_failures_without_stopping() {
        let store = InMemoryStore::new();
        let mut drafts = house_menu();
        drafts.truncate(2);
        drafts.insert(1, item("", "nameless", 100, "coffee", "x"));

        let report = MenuService::new(&store).seed(drafts).await;
        assert_eq!(report.success_count, 2);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.total, 3);
    }

    #[tokio::test]
    async fn test_list_sorted_by_category_then_name() {
        let store = InMemoryStore::new();
        let menu = MenuService::new(&store);
        menu.seed_menu().await;

        let names: Vec<_> = menu
            .list_menu()
            .await
            .unwrap()
            .into_iter()
            .map(|i| (i.record.category, i.record.name))
            .collect();
        assert_eq!(names[0], ("coffee".to_owned(), "Cappuccino Supreme".to_owned()));
        assert_eq!(names[3], ("drinks".to_owned(), "Iced Golden Latte".to_owned()));
        assert_eq!(names[8], ("pastry".to_owned(), "Chocolate Croissant".to_owned()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at() {
        let store = InMemoryStore::new();
        let menu = MenuService::new(&store);
        let id = menu
            .add_menu_item(item("Mocha", "Chocolate espresso", 18_000, "coffee", "m"))
            .await
            .unwrap();

        let patch = MenuItemPatch {
            available: Some(false),
            ..MenuItemPatch::default()
        };
        menu.update_menu_item(&id, &patch).await.unwrap();

        let stored = Records::<MenuItem>::new(&store).require(&id).await.unwrap();
        assert!(!stored.record.available);
        assert!(stored.record.updated_at.is_some());
        assert_eq!(stored.record.name, "Mocha");
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let store = InMemoryStore::new();
        let err = MenuService::new(&store)
            .add_menu_item(item("Refund", "", -100, "coffee", "r"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
