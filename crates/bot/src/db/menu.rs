//! Menu repository.
//!
//! The menu is read and written as a whole. Writes delete every row and
//! insert the new menu inside one transaction, so readers see either the old
//! menu or the new one and never an empty one.

use sqlx::SqlitePool;

use hearty_house_core::menu::{Menu, MenuCategory, MenuItem};
use hearty_house_core::{CategoryId, Price};

use super::RepositoryError;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    category_id: CategoryId,
    name: String,
    price: String,
    description: Option<String>,
}

impl TryFrom<ItemRow> for MenuItem {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::parse_menu_price(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid price {:?} for item {:?}: {e}",
                row.price, row.name
            ))
        })?;

        Ok(Self {
            name: row.name,
            price,
            description: row.description.unwrap_or_default(),
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the menu tables.
pub struct MenuRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MenuRepository<'a> {
    /// Create a new menu repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Load the whole menu in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is invalid.
    #[tracing::instrument(skip(self))]
    pub async fn read(&self) -> Result<Menu, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let categories: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name FROM categories ORDER BY id")
                .fetch_all(&mut *tx)
                .await?;

        let items: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT category_id, name, price, "desc" AS description
            FROM menu_items
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut menu = Menu::new(
            categories
                .iter()
                .map(|c| MenuCategory {
                    name: c.name.clone(),
                    items: Vec::new(),
                })
                .collect(),
        );

        for row in items {
            let Some(pos) = categories.iter().position(|c| c.id == row.category_id) else {
                tracing::warn!(
                    category_id = %row.category_id,
                    item = %row.name,
                    "Skipping menu item with unknown category"
                );
                continue;
            };
            let item = MenuItem::try_from(row)?;
            if let Some(category) = menu.categories.get_mut(pos) {
                category.items.push(item);
            }
        }

        Ok(menu)
    }

    /// Replace the stored menu with `menu`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if two categories share a name.
    /// Returns `RepositoryError::Database` if any statement fails; the stored
    /// menu is then unchanged.
    #[tracing::instrument(skip(self, menu), fields(categories = menu.categories.len(), items = menu.item_count()))]
    pub async fn replace(&self, menu: &Menu) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM menu_items")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM categories")
            .execute(&mut *tx)
            .await?;

        for category in &menu.categories {
            let category_id: CategoryId =
                sqlx::query_scalar("INSERT INTO categories (name) VALUES (?) RETURNING id")
                    .bind(&category.name)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(|e| {
                        RepositoryError::from_write(e, &format!("category {:?}", category.name))
                    })?;

            for item in &category.items {
                sqlx::query(
                    r#"
                    INSERT INTO menu_items (category_id, name, price, "desc")
                    VALUES (?, ?, ?, ?)
                    "#,
                )
                .bind(category_id)
                .bind(&item.name)
                .bind(item.price.to_string())
                .bind(&item.description)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        tracing::info!("Menu replaced");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, schema};

    async fn pool() -> SqlitePool {
        let pool = create_memory_pool().await.unwrap();
        schema::initialize(&pool).await.unwrap();
        pool
    }

    fn item(name: &str, price: i64, description: &str) -> MenuItem {
        MenuItem {
            name: name.to_string(),
            price: Price::new(price),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_menu() {
        let pool = pool().await;
        let menu = MenuRepository::new(&pool).read().await.unwrap();
        assert!(menu.categories.is_empty());
    }

    #[tokio::test]
    async fn test_replace_then_read_preserves_order() {
        let pool = pool().await;
        let repo = MenuRepository::new(&pool);

        let mut menu = Menu::default();
        menu.add_item("Soups", item("Borscht", 450, "With sour cream"))
            .unwrap();
        menu.add_item("Mains", item("Pelmeni", 520, "")).unwrap();
        menu.add_item("Soups", item("Solyanka", 490, "")).unwrap();
        menu.add_category("Desserts").unwrap();

        repo.replace(&menu).await.unwrap();
        let stored = repo.read().await.unwrap();
        assert_eq!(stored, menu);

        // A second replace fully overwrites the first.
        menu.remove_category("Desserts").unwrap();
        menu.remove_item("Soups", 1).unwrap();
        repo.replace(&menu).await.unwrap();
        assert_eq!(repo.read().await.unwrap(), menu);
    }

    #[tokio::test]
    async fn test_duplicate_category_conflicts_and_keeps_old_menu() {
        let pool = pool().await;
        let repo = MenuRepository::new(&pool);

        let mut menu = Menu::default();
        menu.add_item("Soups", item("Borscht", 450, "")).unwrap();
        repo.replace(&menu).await.unwrap();

        let broken = Menu::new(vec![
            MenuCategory {
                name: "Drinks".to_string(),
                items: Vec::new(),
            },
            MenuCategory {
                name: "Drinks".to_string(),
                items: Vec::new(),
            },
        ]);
        let err = repo.replace(&broken).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(repo.read().await.unwrap(), menu);
    }

    #[tokio::test]
    async fn test_invalid_stored_price_is_reported() {
        let pool = pool().await;
        sqlx::query("INSERT INTO categories (name) VALUES ('Soups')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(r#"INSERT INTO menu_items (category_id, name, price, "desc") VALUES (1, 'Borscht', '450 rub', NULL)"#)
            .execute(&pool)
            .await
            .unwrap();

        let err = MenuRepository::new(&pool).read().await.unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
