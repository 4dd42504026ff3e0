//! Order report, rendered exactly as staff see it in the bot.
//!
//! Reads the full bot configuration, so `TELEGRAM_BOT_TOKEN` must be set even
//! though nothing is sent.

use clap::ValueEnum;

use hearty_house_bot::config::BotConfig;
use hearty_house_bot::db::{OrderFilter, OrderRepository};
use hearty_house_bot::services::{Clock, SystemClock};
use hearty_house_bot::views::orders::orders_page;
use hearty_house_core::period::{OrderPeriod, parse_date_input};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Today,
    #[value(name = "3days")]
    ThreeDays,
    Week,
    All,
}

impl From<PeriodArg> for OrderPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Today => Self::Today,
            PeriodArg::ThreeDays => Self::LAST_3_DAYS,
            PeriodArg::Week => Self::LAST_WEEK,
            PeriodArg::All => Self::All,
        }
    }
}

/// The period to report on: an explicit range wins over the preset.
///
/// # Errors
///
/// Returns an error for bad dates, a backwards range, or only one end given.
pub fn resolve_period(
    preset: PeriodArg,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<OrderPeriod, Box<dyn std::error::Error>> {
    match (from, to) {
        (Some(from), Some(to)) => Ok(OrderPeriod::range(
            parse_date_input(from)?,
            parse_date_input(to)?,
        )?),
        (None, None) => Ok(preset.into()),
        _ => Err("--from and --to must be given together".into()),
    }
}

/// Turn the bot's HTML message text into plain terminal text.
#[must_use]
pub fn plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

/// Print every page of the selected orders.
///
/// # Errors
///
/// Returns an error for bad dates, missing configuration or database failures.
pub async fn print(
    preset: PeriodArg,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let period = resolve_period(preset, from, to)?;
    let config = BotConfig::from_env()?;
    let today = SystemClock::new(config.utc_offset).now().date();

    let pool = super::open_database().await?;
    let (from, to) = period.bounds(today);
    let orders = OrderRepository::new(&pool)
        .list(&OrderFilter {
            from,
            to,
            sort: config.orders_sort,
            limit: config.orders_max_rows,
        })
        .await?;
    tracing::info!(count = orders.len(), period = %period.label(), "Orders loaded");

    let mut pages = Vec::new();
    let mut requested = 0;
    while let Some((page, reply)) = orders_page(&config, &orders, &period, requested, today) {
        if page < requested {
            break;
        }
        pages.push(plain_text(&reply.text));
        requested = page + 1;
    }

    #[allow(clippy::print_stdout)]
    {
        if pages.is_empty() {
            println!("No orders for {}.", period.label());
        }
        for page in pages {
            println!("{page}\n");
        }
    }
    Ok(())
}
