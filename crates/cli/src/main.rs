//! Hearty House CLI - schema, menu and order tools.
//!
//! # Usage
//!
//! ```bash
//! # Create or upgrade the database schema
//! hh-cli migrate
//!
//! # Replace the menu from a YAML file, or print the current one
//! hh-cli menu import menu.yaml
//! hh-cli menu export > menu.yaml
//!
//! # Print orders for a period or a date range
//! hh-cli orders --period week
//! hh-cli orders --from 01.03.2025 --to 15.03.2025
//! ```
//!
//! All commands read `DATABASE_PATH` (and `.env`) like the bot does.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::orders::PeriodArg;

#[derive(Parser)]
#[command(name = "hh-cli")]
#[command(author, version, about = "Hearty House CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Import or export the menu
    Menu {
        #[command(subcommand)]
        action: MenuAction,
    },
    /// Print rendered order pages
    Orders {
        /// Preset period
        #[arg(short, long, value_enum, default_value = "today")]
        period: PeriodArg,

        /// Range start (DD.MM.YYYY); overrides --period together with --to
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Range end (DD.MM.YYYY)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
}

#[derive(Subcommand)]
enum MenuAction {
    /// Replace the whole menu with the contents of a YAML file
    Import {
        /// Path to the YAML menu
        file: String,

        /// Validate only, do not write
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the current menu as YAML
    Export,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Menu { action } => match action {
            MenuAction::Import { file, dry_run } => commands::menu::import(&file, dry_run).await?,
            MenuAction::Export => commands::menu::export().await?,
        },
        Commands::Orders { period, from, to } => {
            commands::orders::print(period, from.as_deref(), to.as_deref()).await?;
        }
    }
    Ok(())
}
