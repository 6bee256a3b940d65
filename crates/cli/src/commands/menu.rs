//! Menu commands.
//!
//! # Usage
//!
//! ```bash
//! skydeck menu seed
//! skydeck menu list
//! ```

use skydeck_backend::AppState;
use tracing::info;

use super::CommandError;

/// Insert the house menu.
///
/// # Errors
///
/// Returns `Partial` if any item could not be written.
pub async fn seed(state: &AppState) -> Result<(), CommandError> {
    let report = state.menu().seed_menu().await;
    info!(
        "Seeded {} of {} menu items",
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

/// Print every menu item grouped by category.
///
/// # Errors
///
/// Returns an error if the menu can't be read.
pub async fn list(state: &AppState) -> Result<(), CommandError> {
    let items = state.menu().list_menu().await?;
    if items.is_empty() {
        info!("Menu is empty");
        return Ok(());
    }

    let mut category: Option<&str> = None;
    for item in &items {
        if category != Some(item.record.category.as_str()) {
            category = Some(item.record.category.as_str());
            info!("[{}]", item.record.category);
        }
        let flag = if item.record.available { "" } else { " (unavailable)" };
        info!(
            "  {} - {} {}{}",
            item.id, item.record.name, item.record.price, flag
        );
    }
    info!("{} items", items.len());
    Ok(())
}
