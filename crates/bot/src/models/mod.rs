//! Domain models owned by the bot.

pub mod callback;
pub mod order;
pub mod session;
pub mod user;

pub use callback::Callback;
pub use order::{NewOrder, Order};
pub use session::{AdminStep, Browsing, Session, Step};
pub use user::User;
