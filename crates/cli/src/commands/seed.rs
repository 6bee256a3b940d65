//! Sample data for a fresh project.
//!
//! # Usage
//!
//! ```bash
//! skydeck seed sample
//! ```

use skydeck_backend::AppState;
use skydeck_backend::models::{ContactInfo, SocialMedia};
use skydeck_backend::services::menu::MenuItemDraft;
use skydeck_core::Price;
use tracing::info;

use super::CommandError;

fn sample_item(name: &str, description: &str, pesos: i64, category: &str) -> MenuItemDraft {
    MenuItemDraft {
        name: name.to_owned(),
        description: description.to_owned(),
        price: Price::from_cents(pesos * 100),
        category: category.to_owned(),
        image_url: String::new(),
        available: true,
    }
}

fn sample_menu() -> Vec<MenuItemDraft> {
    vec![
        sample_item(
            "Espresso",
            "Rich and bold espresso shot",
            120,
            "Hot Coffee",
        ),
        sample_item(
            "Cappuccino",
            "Espresso with steamed milk and foam",
            150,
            "Hot Coffee",
        ),
        sample_item(
            "Iced Americano",
            "Chilled espresso with water and ice",
            140,
            "Cold Coffee",
        ),
    ]
}

fn sample_contact() -> ContactInfo {
    ContactInfo {
        business_name: "Lagusan Coffee Sky Deck".to_owned(),
        phone: "+63 123 456 7890".to_owned(),
        email: "info@lagusancoffee.com".to_owned(),
        website: "https://lagusancoffee.com".to_owned(),
        address: "Lagusan, Butuan City, Philippines".to_owned(),
        opening_time: "06:00".to_owned(),
        closing_time: "22:00".to_owned(),
        description: "Experience the finest coffee with a breathtaking view at Lagusan Coffee \
                      Sky Deck."
            .to_owned(),
        social_media: SocialMedia {
            facebook: "https://facebook.com/lagusancoffee".to_owned(),
            instagram: "https://instagram.com/lagusancoffee".to_owned(),
            twitter: String::new(),
        },
        updated_at: None,
    }
}

/// Write the sample contact details and three sample menu items.
///
/// # Errors
///
/// Returns an error if the contact details can't be written, or `Partial`
/// if any menu item fails.
pub async fn sample(state: &AppState) -> Result<(), CommandError> {
    let contact_id = state.content().update_contact_info(sample_contact()).await?;
    info!("Contact info written ({contact_id})");

    let report = state.menu().seed(sample_menu()).await;
    info!(
        "Seeded {} of {} sample menu items",
        report.success_count, report.total
    );

    if report.error_count > 0 {
        return Err(CommandError::Partial {
            failed: report.error_count,
            total: report.total,
        });
    }
    Ok(())
}
