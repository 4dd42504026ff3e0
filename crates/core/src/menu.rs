//! Menu categories and items, with the edit operations staff can perform.
//!
//! The menu is always written back as a whole, so edits happen on an
//! in-memory [`Menu`] loaded from storage and the result replaces the stored
//! menu in one go.

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Token staff type to leave an optional field empty.
pub const NONE_TOKEN: &str = "none";

/// Errors from menu edits.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    #[error("category name cannot be empty")]
    EmptyCategoryName,
    #[error("category {0:?} already exists")]
    DuplicateCategory(String),
    #[error("category {0:?} not found")]
    CategoryNotFound(String),
    #[error("category {name:?} still has {items} item(s)")]
    CategoryNotEmpty { name: String, items: usize },
    #[error("item number {index} is out of range (1..={len})")]
    ItemIndexOutOfRange { index: usize, len: usize },
    #[error("item number must be a positive integer")]
    InvalidItemIndex,
}

/// A dish on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Map the `none` token (any case) and blank input to an empty description.
#[must_use]
pub fn normalize_description(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case(NONE_TOKEN) {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// A named group of dishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub name: String,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// The whole menu in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub categories: Vec<MenuCategory>,
}

impl Menu {
    #[must_use]
    pub const fn new(categories: Vec<MenuCategory>) -> Self {
        Self { categories }
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&MenuCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    fn category_mut(&mut self, name: &str) -> Option<&mut MenuCategory> {
        self.categories.iter_mut().find(|c| c.name == name)
    }

    /// Append an empty category.
    ///
    /// # Errors
    ///
    /// Fails for an empty name or a name already in use.
    pub fn add_category(&mut self, name: &str) -> Result<(), MenuError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MenuError::EmptyCategoryName);
        }
        if self.category(name).is_some() {
            return Err(MenuError::DuplicateCategory(name.to_string()));
        }
        self.categories.push(MenuCategory {
            name: name.to_string(),
            items: Vec::new(),
        });
        Ok(())
    }

    /// Remove a category that has no items.
    ///
    /// # Errors
    ///
    /// Fails when the category is missing or still has items; the menu is
    /// left unchanged.
    pub fn remove_category(&mut self, name: &str) -> Result<(), MenuError> {
        let pos = self
            .categories
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| MenuError::CategoryNotFound(name.to_string()))?;
        let items = self.categories.get(pos).map_or(0, |c| c.items.len());
        if items > 0 {
            return Err(MenuError::CategoryNotEmpty {
                name: name.to_string(),
                items,
            });
        }
        self.categories.remove(pos);
        Ok(())
    }

    /// Append an item to a category, creating the category if needed.
    ///
    /// # Errors
    ///
    /// Fails for an empty category name.
    pub fn add_item(&mut self, category: &str, item: MenuItem) -> Result<(), MenuError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(MenuError::EmptyCategoryName);
        }
        if let Some(existing) = self.category_mut(category) {
            existing.items.push(item);
        } else {
            self.categories.push(MenuCategory {
                name: category.to_string(),
                items: vec![item],
            });
        }
        Ok(())
    }

    /// Remove an item by its 1-based position as shown to staff.
    ///
    /// # Errors
    ///
    /// Fails for a missing category or an out-of-range index; the menu is left
    /// unchanged.
    pub fn remove_item(&mut self, category: &str, index: usize) -> Result<MenuItem, MenuError> {
        let cat = self
            .category_mut(category)
            .ok_or_else(|| MenuError::CategoryNotFound(category.to_string()))?;
        let len = cat.items.len();
        if index == 0 || index > len {
            return Err(MenuError::ItemIndexOutOfRange { index, len });
        }
        Ok(cat.items.remove(index - 1))
    }

    /// Total number of items across categories.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }
}

/// Parse a 1-based item number typed by staff.
///
/// # Errors
///
/// Returns [`MenuError::InvalidItemIndex`] for anything but a positive integer.
pub fn parse_item_index(input: &str) -> Result<usize, MenuError> {
    match input.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(MenuError::InvalidItemIndex),
    }
}
