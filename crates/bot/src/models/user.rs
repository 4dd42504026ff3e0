//! Customer record.

use hearty_house_core::{Phone, UserId};

/// A customer known to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Shared through a Telegram contact; absent until onboarding completes.
    pub phone: Option<Phone>,
    /// Saved delivery addresses, oldest first, without duplicates.
    pub addresses: Vec<String>,
}
