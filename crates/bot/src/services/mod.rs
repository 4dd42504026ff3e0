//! Supporting services used by the handlers.
//!
//! - [`sessions`] - In-memory per-conversation state with idle expiry
//! - [`clock`] - Restaurant-local "now", injectable for tests
//! - [`notifications`] - Fan-out of one message to many chats

pub mod clock;
pub mod notifications;
pub mod sessions;

pub use clock::{Clock, FixedClock, SystemClock};
pub use notifications::{FanOut, fan_out};
pub use sessions::SessionStore;
