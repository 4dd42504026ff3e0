//! Unified error handling for the bot.
//!
//! Validation problems never become errors: handlers answer them in place.
//! What reaches [`AppError`] is infrastructure failing underneath a
//! conversation, and the user only ever sees [`AppError::user_message`].

use thiserror::Error;

use crate::db::RepositoryError;
use crate::transport::TransportError;

/// Text shown to the user whenever an update could not be handled.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again.";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Talking to Telegram failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl AppError {
    /// Safe text for the user. Never includes internal details.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        GENERIC_FAILURE
    }

    /// Whether the error is worth an error-tracking event.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Repository(_) => true,
            Self::Transport(err) => !err.is_transient() && !matches!(err, TransportError::ChatUnavailable(_)),
        }
    }

    /// Log the error; server errors are also captured by Sentry.
    pub fn report(&self, user_id: hearty_house_core::UserId) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                user_id = %user_id,
                sentry_event_id = %event_id,
                "Update handling failed"
            );
        } else {
            tracing::warn!(error = %self, user_id = %user_id, "Update handling failed");
        }
    }
}

/// Set the Sentry user context for the update being handled.
pub fn set_sentry_user(user_id: hearty_house_core::UserId, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}
