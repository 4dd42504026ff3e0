//! Hearty House - Telegram ordering bot.
//!
//! Customers browse the menu, fill a cart and check out; staff listed in
//! `ADMIN_IDS` edit the menu, review orders and broadcast announcements.
//!
//! # Architecture
//!
//! - teloxide long polling feeds [`BotService`]
//! - `SQLite` (sqlx) holds the menu, users and orders
//! - Conversation state lives in an in-memory moka cache
//! - Sentry receives warnings and errors through the tracing layer

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use teloxide::Bot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hearty_house_bot::config::BotConfig;
use hearty_house_bot::db;
use hearty_house_bot::handlers::BotService;
use hearty_house_bot::state::AppState;
use hearty_house_bot::telegram::{self, TelegramTransport};
use hearty_house_bot::transport::{RetryPolicy, Retrying};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &BotConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let config = BotConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hearty_house_bot=info".into());

    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let pool = db::create_pool(&config.database_path)
        .await
        .expect("Failed to open database");
    db::schema::initialize(&pool)
        .await
        .expect("Failed to initialize database schema");
    tracing::info!(path = %config.database_path.display(), "Database ready");

    let bot = Bot::new(config.telegram.token.expose_secret());
    let transport = Retrying::new(TelegramTransport::new(bot.clone()), RetryPolicy::default());
    let state = AppState::new(config, pool);
    let service = Arc::new(BotService::new(state, transport));

    tracing::info!(
        admins = service.state().config().admin_ids.len(),
        "Hearty House bot starting"
    );
    telegram::run(bot, service).await;
    tracing::info!("Bot stopped");
}
