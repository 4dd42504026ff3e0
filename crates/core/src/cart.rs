//! Transient per-conversation cart.

use serde::{Deserialize, Serialize};

use crate::markup::escape_html;
use crate::menu::MenuItem;
use crate::types::Price;

/// A menu item placed in the cart, remembering the category it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub price: Price,
    pub description: String,
    pub category: String,
}

impl CartLine {
    #[must_use]
    pub fn from_item(item: &MenuItem, category: &str) -> Self {
        Self {
            name: item.name.clone(),
            price: item.price,
            description: item.description.clone(),
            category: category.to_string(),
        }
    }
}

/// Ordered list of selected items. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn add(&mut self, line: CartLine) {
        self.lines.push(line);
    }

    /// Remove everything. Clearing an empty cart does nothing.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of item prices.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(|line| line.price).sum()
    }

    /// Lines grouped by category, categories in first-seen order.
    #[must_use]
    pub fn grouped_by_category(&self) -> Vec<(&str, Vec<&CartLine>)> {
        let mut groups: Vec<(&str, Vec<&CartLine>)> = Vec::new();
        for line in &self.lines {
            match groups.iter_mut().find(|(cat, _)| *cat == line.category) {
                Some((_, lines)) => lines.push(line),
                None => groups.push((line.category.as_str(), vec![line])),
            }
        }
        groups
    }

    /// HTML body listing the cart by category, ending with the subtotal.
    ///
    /// This is the text stored as the order body and sent to staff.
    #[must_use]
    pub fn render(&self, currency: &str) -> String {
        let mut out = String::new();
        for (category, lines) in self.grouped_by_category() {
            out.push_str(&format!("<b>{}</b>\n", escape_html(category)));
            for line in lines {
                out.push_str(&format!(
                    "• {} - {}\n",
                    escape_html(&line.name),
                    line.price.display(currency)
                ));
                let desc = line.description.trim();
                if !desc.is_empty() {
                    out.push_str(&format!("  {}\n", escape_html(desc)));
                }
            }
            out.push('\n');
        }
        out.push_str(&format!("Subtotal: {}", self.total().display(currency)));
        out
    }
}
