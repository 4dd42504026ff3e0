//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TELEGRAM_BOT_TOKEN` - Bot API token from `@BotFather`
//!
//! ## Optional
//! - `DATABASE_PATH` - `SQLite` file path (default: `hearty_house.db`)
//! - `ADMIN_IDS` - Comma-separated staff chat ids (default: none)
//! - `UTC_OFFSET_HOURS` - Restaurant's fixed UTC offset (default: 8)
//! - `BUSINESS_OPEN` / `BUSINESS_CLOSE` - Opening hours (default: 10:00 / 21:00)
//! - `ORDER_WINDOW_START` / `ORDER_WINDOW_END` - Selectable prep times (default: 10:00 / 20:30)
//! - `ASAP_CUTOFF` - "As soon as possible" offered before this time (default: 20:30)
//! - `SLOT_STEP_MINUTES` - Slot spacing (default: 30)
//! - `DELIVERY_LEAD_MINUTES` / `PICKUP_LEAD_MINUTES` - Minimum lead time (default: 60 / 30)
//! - `MIN_ORDER_FOR_DELIVERY` - Smallest cart eligible for delivery (default: 1000)
//! - `FREE_DELIVERY_MIN` - Cart total with free delivery (default: 2000)
//! - `FLAT_DELIVERY_FEE` - Delivery fee below that (default: 200)
//! - `MIN_CASH_AMOUNT` - Smallest accepted cash amount (default: 500)
//! - `PICKUP_ADDRESS` - Where pickup orders are collected
//! - `RESTAURANT_NAME` - Shown in headings (default: Hearty House)
//! - `CURRENCY_SYMBOL` - Shown after prices (default: ₽)
//! - `WELCOME_PHOTO` - Local path or https URL sent on `/start`
//! - `REQUIRE_PAYMENT_FOR_PICKUP` - Ask pickup customers how they pay (default: false)
//! - `ORDERS_SORT` - `newest` or `oldest` (default: newest)
//! - `ORDERS_MAX_ROWS` - Cap on orders loaded for review (default: 1000)
//! - `SESSION_IDLE_MINUTES` - Idle time before a conversation is forgotten (default: 180)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Sentry error sample rate (default: 1.0)

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, NaiveTime, Offset, Utc};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use hearty_house_core::UserId;
use hearty_house_core::pricing::DeliveryPolicy;
use hearty_house_core::schedule::Hours;
use hearty_house_core::{Price, SortDirection};

use crate::transport::PhotoSource;

const DEFAULT_DATABASE_PATH: &str = "hearty_house.db";
const DEFAULT_RESTAURANT_NAME: &str = "Hearty House";
const DEFAULT_CURRENCY_SYMBOL: &str = "₽";
const DEFAULT_PICKUP_ADDRESS: &str = "Hearty House, front counter";

/// `DATABASE_PATH` on its own, for tools that need nothing else.
#[must_use]
pub fn database_path_from_env() -> PathBuf {
    let _ = dotenvy::dotenv();
    PathBuf::from(get_env_or_default("DATABASE_PATH", DEFAULT_DATABASE_PATH))
}

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Interpret a configured welcome photo source.
///
/// Telegram refuses plain-http URLs, so those are dropped with a warning.
fn parse_welcome_photo(value: &str) -> Option<PhotoSource> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("https://") {
        Some(PhotoSource::Url(value.to_string()))
    } else if value.starts_with("http://") {
        tracing::warn!(
            photo = %value,
            "WELCOME_PHOTO uses http, which Telegram does not accept; use https"
        );
        None
    } else {
        Some(PhotoSource::File(PathBuf::from(value)))
    }
}

/// Telegram credentials.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot API token (`<bot id>:<secret>`)
    pub token: SecretString,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl TelegramConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let token = get_required_env("TELEGRAM_BOT_TOKEN")?;
        validate_bot_token(&token, "TELEGRAM_BOT_TOKEN")?;
        Ok(Self {
            token: SecretString::from(token),
        })
    }

    /// Numeric bot id, the part of the token before the colon.
    #[must_use]
    pub fn bot_id(&self) -> Option<&str> {
        self.token.expose_secret().split_once(':').map(|(id, _)| id)
    }
}

/// Bot configuration, loaded once at start-up and shared read-only.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram: TelegramConfig,
    /// `SQLite` database file
    pub database_path: PathBuf,
    /// Staff allow-list
    pub admin_ids: BTreeSet<UserId>,
    /// Restaurant's fixed UTC offset (no daylight saving)
    pub utc_offset: FixedOffset,
    pub hours: Hours,
    pub delivery_lead_minutes: u32,
    pub pickup_lead_minutes: u32,
    pub pricing: DeliveryPolicy,
    pub pickup_address: String,
    pub restaurant_name: String,
    pub currency_symbol: String,
    pub welcome_photo: Option<PhotoSource>,
    pub require_payment_for_pickup: bool,
    pub orders_sort: SortDirection,
    pub orders_max_rows: u32,
    /// Conversation state is dropped after this much inactivity
    pub session_idle: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse or validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let telegram = TelegramConfig::from_env()?;
        let database_path = PathBuf::from(get_env_or_default(
            "DATABASE_PATH",
            DEFAULT_DATABASE_PATH,
        ));
        let admin_ids = parse_admin_ids(&get_env_or_default("ADMIN_IDS", ""))?;

        let offset_hours: i32 = parse_env("UTC_OFFSET_HOURS", "8")?;
        let utc_offset = offset_from_hours(offset_hours).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "UTC_OFFSET_HOURS".to_string(),
                format!("{offset_hours} is out of range"),
            )
        })?;

        let hours = Hours {
            business_open: parse_time_env("BUSINESS_OPEN", "10:00")?,
            business_close: parse_time_env("BUSINESS_CLOSE", "21:00")?,
            window_start: parse_time_env("ORDER_WINDOW_START", "10:00")?,
            window_end: parse_time_env("ORDER_WINDOW_END", "20:30")?,
            asap_cutoff: parse_time_env("ASAP_CUTOFF", "20:30")?,
            step_minutes: parse_env("SLOT_STEP_MINUTES", "30")?,
        };
        validate_hours(&hours)?;

        let pricing = DeliveryPolicy {
            min_order_for_delivery: Price::new(parse_env("MIN_ORDER_FOR_DELIVERY", "1000")?),
            free_delivery_min: Price::new(parse_env("FREE_DELIVERY_MIN", "2000")?),
            flat_delivery_fee: Price::new(parse_env("FLAT_DELIVERY_FEE", "200")?),
            min_cash_amount: Price::new(parse_env("MIN_CASH_AMOUNT", "500")?),
        };
        validate_pricing(&pricing)?;

        let orders_sort = get_env_or_default("ORDERS_SORT", "newest")
            .parse::<SortDirection>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORDERS_SORT".to_string(), e))?;

        let session_idle_minutes: u64 = parse_env("SESSION_IDLE_MINUTES", "180")?;

        Ok(Self {
            telegram,
            database_path,
            admin_ids,
            utc_offset,
            hours,
            delivery_lead_minutes: parse_env("DELIVERY_LEAD_MINUTES", "60")?,
            pickup_lead_minutes: parse_env("PICKUP_LEAD_MINUTES", "30")?,
            pricing,
            pickup_address: get_env_or_default("PICKUP_ADDRESS", DEFAULT_PICKUP_ADDRESS),
            restaurant_name: get_env_or_default("RESTAURANT_NAME", DEFAULT_RESTAURANT_NAME),
            currency_symbol: get_env_or_default("CURRENCY_SYMBOL", DEFAULT_CURRENCY_SYMBOL),
            welcome_photo: get_optional_env("WELCOME_PHOTO")
                .as_deref()
                .and_then(parse_welcome_photo),
            require_payment_for_pickup: parse_bool_env("REQUIRE_PAYMENT_FOR_PICKUP", false)?,
            orders_sort,
            orders_max_rows: parse_env("ORDERS_MAX_ROWS", "1000")?,
            session_idle: Duration::from_secs(session_idle_minutes.saturating_mul(60)),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Whether `user` may use the staff surfaces.
    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_ids.contains(&user)
    }

    /// Configuration for tests and tools that never talk to Telegram.
    ///
    /// Uses the documented defaults with the given staff ids.
    #[must_use]
    pub fn for_tests(admin_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            telegram: TelegramConfig {
                token: SecretString::from("123456:test-token"),
            },
            database_path: PathBuf::from(":memory:"),
            admin_ids: admin_ids.into_iter().map(UserId::new).collect(),
            utc_offset: offset_from_hours(8).unwrap_or_else(|| Utc.fix()),
            hours: Hours::default(),
            delivery_lead_minutes: 60,
            pickup_lead_minutes: 30,
            pricing: DeliveryPolicy::default(),
            pickup_address: DEFAULT_PICKUP_ADDRESS.to_string(),
            restaurant_name: DEFAULT_RESTAURANT_NAME.to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            welcome_photo: None,
            require_payment_for_pickup: false,
            orders_sort: SortDirection::NewestFirst,
            orders_max_rows: 1000,
            session_idle: Duration::from_secs(180 * 60),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    hours.checked_mul(3600).and_then(FixedOffset::east_opt)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_time_env(key: &str, default: &str) -> Result<NaiveTime, ConfigError> {
    let value = get_env_or_default(key, default);
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), format!("{value:?}: {e}")))
}

fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match get_optional_env(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected true/false, got {other:?}"),
            )),
        },
    }
}

/// Parse a comma-separated list of chat ids. Blank entries are skipped.
fn parse_admin_ids(value: &str) -> Result<BTreeSet<UserId>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map(UserId::new)
                .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_IDS".to_string(), format!("{s:?}: {e}")))
        })
        .collect()
}

/// A bot token is `<digits>:<secret>`.
fn validate_bot_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let valid = token.split_once(':').is_some_and(|(id, secret)| {
        !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) && !secret.is_empty()
    });
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "expected <bot id>:<secret>".to_string(),
        ))
    }
}

fn validate_hours(hours: &Hours) -> Result<(), ConfigError> {
    if hours.step_minutes == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "SLOT_STEP_MINUTES".to_string(),
            "must be positive".to_string(),
        ));
    }
    if hours.window_start >= hours.window_end {
        return Err(ConfigError::InvalidEnvVar(
            "ORDER_WINDOW_START".to_string(),
            "must be earlier than ORDER_WINDOW_END".to_string(),
        ));
    }
    if hours.business_open >= hours.business_close {
        return Err(ConfigError::InvalidEnvVar(
            "BUSINESS_OPEN".to_string(),
            "must be earlier than BUSINESS_CLOSE".to_string(),
        ));
    }
    Ok(())
}

fn validate_pricing(pricing: &DeliveryPolicy) -> Result<(), ConfigError> {
    let fields = [
        ("MIN_ORDER_FOR_DELIVERY", pricing.min_order_for_delivery),
        ("FREE_DELIVERY_MIN", pricing.free_delivery_min),
        ("FLAT_DELIVERY_FEE", pricing.flat_delivery_fee),
        ("MIN_CASH_AMOUNT", pricing.min_cash_amount),
    ];
    for (name, value) in fields {
        if value.amount() < 0 {
            return Err(ConfigError::InvalidEnvVar(
                name.to_string(),
                "must not be negative".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_admin_ids() {
        let ids = parse_admin_ids(" 370884641, ,12345 ,").unwrap();
        assert_eq!(
            ids.into_iter().collect::<Vec<_>>(),
            vec![UserId::new(12345), UserId::new(370_884_641)]
        );
        assert!(parse_admin_ids("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_admin_ids_rejects_garbage() {
        let err = parse_admin_ids("123,abc").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref name, _) if name == "ADMIN_IDS"));
    }

    #[test]
    fn test_validate_bot_token() {
        assert!(validate_bot_token("123456:AAE-secret", "T").is_ok());
        assert!(validate_bot_token("no-colon", "T").is_err());
        assert!(validate_bot_token("abc:secret", "T").is_err());
        assert!(validate_bot_token("123:", "T").is_err());
    }

    #[test]
    fn test_validate_hours_rejects_inverted_window() {
        let mut hours = Hours::default();
        assert!(validate_hours(&hours).is_ok());

        hours.window_start = NaiveTime::from_hms_opt(21, 0, 0).unwrap();
        assert!(validate_hours(&hours).is_err());

        let zero_step = Hours {
            step_minutes: 0,
            ..Hours::default()
        };
        assert!(validate_hours(&zero_step).is_err());
    }

    #[test]
    fn test_welcome_photo_sources() {
        assert_eq!(
            parse_welcome_photo("https://cdn.example.com/logo.jpg"),
            Some(PhotoSource::Url("https://cdn.example.com/logo.jpg".to_string()))
        );
        assert_eq!(
            parse_welcome_photo("png/logo.jpg"),
            Some(PhotoSource::File(PathBuf::from("png/logo.jpg")))
        );
        assert_eq!(parse_welcome_photo("http://cdn.example.com/logo.jpg"), None);
        assert_eq!(parse_welcome_photo("  "), None);
    }

    #[test]
    fn test_offset_from_hours() {
        assert_eq!(offset_from_hours(8).unwrap().local_minus_utc(), 8 * 3600);
        assert!(offset_from_hours(30).is_none());
    }

    #[test]
    fn test_telegram_config_debug_redacts_token() {
        let config = TelegramConfig {
            token: SecretString::from("123456:super-secret-token"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-token"));
        assert_eq!(config.bot_id(), Some("123456"));
    }

    #[test]
    fn test_is_admin() {
        let config = BotConfig::for_tests([42]);
        assert!(config.is_admin(UserId::new(42)));
        assert!(!config.is_admin(UserId::new(7)));
    }
}
