//! Message builders.
//!
//! Every text and keyboard the bot shows is assembled here, so handlers only
//! decide *what* to show. Texts use Telegram's HTML parse mode; anything a
//! user typed goes through [`escape_html`] before it is embedded.

pub mod admin;
pub mod customer;
pub mod orders;

use hearty_house_core::markup::{escape_html, truncate_chars};

use crate::models::Callback;
use crate::transport::Button;

/// Toast for buttons whose context is gone.
pub const STALE_ACTION: &str = "This action is no longer available";

/// Longest button label before it is shortened.
const MAX_LABEL_CHARS: usize = 40;

/// Budget for free-form listings such as the staff menu overview.
const LISTING_CHARS: usize = 3800;

fn button(label: impl AsRef<str>, callback: Callback) -> Button {
    Button::new(truncate_chars(label.as_ref(), MAX_LABEL_CHARS), callback.to_string())
}

/// Lay buttons out `per_row` to a row.
fn rows(buttons: Vec<Button>, per_row: usize) -> Vec<Vec<Button>> {
    buttons
        .chunks(per_row.max(1))
        .map(<[Button]>::to_vec)
        .collect()
}

fn cancel_row() -> Vec<Button> {
    vec![button("✖ Cancel", Callback::Cancel)]
}

/// Append `line` to `out` unless that would pass `budget` characters.
///
/// Returns `false` once the budget is exhausted; an ellipsis line marks the cut.
fn push_line(out: &mut String, line: &str, budget: usize) -> bool {
    if out.chars().count() + line.chars().count() + 1 > budget {
        out.push('…');
        return false;
    }
    out.push_str(line);
    out.push('\n');
    true
}

pub(crate) fn quoted(name: &str) -> String {
    format!("«{}»", escape_html(name))
}
