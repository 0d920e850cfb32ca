//! betscrape CLI

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use betscrape::cli::{self, Cli, Commands};
use betscrape::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "betscrape=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape {
            bookmaker,
            sport,
            max_items,
            pacing_ms,
            output,
            static_html,
            format,
        } => {
            let config = AppConfig::load()?;
            cli::run_scrape(
                config,
                bookmaker,
                sport,
                max_items,
                pacing_ms,
                output,
                static_html,
                format,
            )
            .await
        }
        Commands::Event {
            url,
            bookmaker,
            sport,
            static_html,
            format,
        } => {
            let config = AppConfig::load()?;
            cli::run_event(config, url, bookmaker, sport, static_html, format).await
        }
        Commands::Sports { bookmaker } => cli::run_sports(bookmaker),
    }
}
