//! Menu import and export.
//!
//! The YAML layout mirrors the stored menu:
//!
//! ```yaml
//! categories:
//!   - name: Soups
//!     items:
//!       - name: Borscht
//!         price: 450
//!         description: With sour cream
//!   - name: Drinks
//!     items: []
//! ```
//!
//! Import replaces the whole menu, the same way the bot's admin edits do.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use hearty_house_bot::db::MenuRepository;
use hearty_house_core::Price;
use hearty_house_core::menu::Menu;

#[derive(Debug, Error)]
pub enum MenuFileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("{0} validation error(s) found")]
    Invalid(usize),
}

/// Problems that would make the menu unusable in the bot.
#[must_use]
pub fn validate(menu: &Menu) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (n, category) in menu.categories.iter().enumerate() {
        let name = category.name.trim();
        if name.is_empty() {
            errors.push(format!("category #{} has an empty name", n + 1));
            continue;
        }
        if name != category.name {
            errors.push(format!("category {name:?} has surrounding whitespace"));
        }
        if !seen.insert(name) {
            errors.push(format!("category {name:?} appears more than once"));
        }
        for item in &category.items {
            if item.name.trim().is_empty() {
                errors.push(format!("category {name:?} has a dish with an empty name"));
            }
            if item.price <= Price::ZERO {
                errors.push(format!(
                    "dish {:?} in {name:?} must have a positive price",
                    item.name
                ));
            }
        }
    }
    errors
}

/// Replace the stored menu with `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or the database write fails.
pub async fn import(file_path: &str, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(MenuFileError::NotFound(file_path.to_string()).into());
    }

    tracing::info!(path = %file_path, "Loading menu from file");
    let content = tokio::fs::read_to_string(path).await?;
    let menu: Menu = serde_yaml::from_str(&content)?;

    let errors = validate(&menu);
    if !errors.is_empty() {
        tracing::error!("Menu validation failed:");
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(MenuFileError::Invalid(errors.len()).into());
    }

    tracing::info!(
        categories = menu.categories.len(),
        dishes = menu.item_count(),
        "Menu validated"
    );
    if dry_run {
        tracing::info!("Dry run, nothing written");
        return Ok(());
    }

    let pool = super::open_database().await?;
    MenuRepository::new(&pool).replace(&menu).await?;
    tracing::info!("Menu imported");
    Ok(())
}

/// Print the stored menu as YAML on stdout.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub async fn export() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::open_database().await?;
    let menu = MenuRepository::new(&pool).read().await?;
    let yaml = serde_yaml::to_string(&menu)?;

    #[allow(clippy::print_stdout)]
    {
        print!("{yaml}");
    }
    Ok(())
}
