//! CLI commands for betscrape.
//!
//! `scrape` runs one extraction pass and writes a JSON artifact, `event`
//! scrapes a single page, `sports` lists what each bookmaker supports.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::scraper::{
    run, sport_url, BookmakerProfile, BookmakerScraper, BrowsingSurface, ChromeSurface, ConfiguredScraper,
    DebugDumpObserver, HttpSurface, LoggingObserver, Pacer, SelectorTable, TraversalController,
};
use crate::storage::{JsonStore, ResultRecord};
use crate::types::{Event, SportType};

#[derive(Parser)]
#[command(name = "betscrape")]
#[command(version, about = "Extract betting markets from bookmaker pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape the event listings of one or more sports
    Scrape {
        /// Bookmaker id
        #[arg(short, long, default_value = "sportsbet")]
        bookmaker: String,

        /// Sports to scrape (soccer, horse-racing, nrl, ...)
        #[arg(short, long, value_delimiter = ',', default_value = "soccer")]
        sport: Vec<String>,

        /// Maximum event pages visited across the whole run
        #[arg(short, long)]
        max_items: Option<usize>,

        /// Minimum delay between page visits in milliseconds
        #[arg(long)]
        pacing_ms: Option<u64>,

        /// Output directory for the JSON artifact
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fetch static HTML instead of rendering pages in Chrome
        #[arg(long)]
        static_html: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Scrape a single event page
    Event {
        /// Event URL
        #[arg(value_name = "URL")]
        url: String,

        /// Bookmaker id
        #[arg(short, long, default_value = "sportsbet")]
        bookmaker: String,

        /// Sport override; inferred from the URL by default
        #[arg(short, long)]
        sport: Option<String>,

        /// Fetch static HTML instead of rendering the page in Chrome
        #[arg(long)]
        static_html: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List supported sports
    Sports {
        /// Only show this bookmaker
        #[arg(short, long)]
        bookmaker: Option<String>,
    },
}

/// Run the scrape command. Fails when the run itself failed.
#[allow(clippy::too_many_arguments)]
pub async fn run_scrape(
    mut config: AppConfig,
    bookmaker: String,
    sports: Vec<String>,
    max_items: Option<usize>,
    pacing_ms: Option<u64>,
    output: Option<PathBuf>,
    static_html: bool,
    format: String,
) -> anyhow::Result<()> {
    // CLI flags override config
    if let Some(n) = max_items {
        config.scraper.max_items = n;
    }
    if let Some(ms) = pacing_ms {
        config.scraper.pacing_ms = ms;
    }
    if let Some(dir) = output {
        config.output.dir = dir.to_string_lossy().into_owned();
    }

    let sports = parse_sports(&sports)?;
    let profile = find_profile(&bookmaker)?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupted, stopping after the current page...");
                cancel.cancel();
            }
        }
    });

    let surface = open_surface(&config, &profile, static_html).await?;
    let scraper = build_scraper(&config, profile, surface.clone(), cancel)?;

    eprintln!(
        "Scraping {} for {} (max {} pages per run)",
        scraper.bookmaker().name,
        sports.iter().map(SportType::as_str).collect::<Vec<_>>().join(", "),
        config.scraper.max_items
    );
    let result = run(&scraper, &sports).await;

    if let Err(e) = surface.close().await {
        tracing::warn!("Failed to close browsing surface: {}", e);
    }

    let label = sports
        .iter()
        .map(|s| s.as_str().to_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    let path = JsonStore::new(&config.output.dir).save(&result, &label)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&ResultRecord::from(&result))?),
        "table" => print_events(&result.events),
        _ => {
            eprintln!("Unknown format: {}. Using table.", format);
            print_events(&result.events);
        }
    }
    eprintln!("Saved {} event(s) to {}", result.events.len(), path.display());

    if !result.success {
        bail!(
            "Scrape failed: {}",
            result.error_message.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}

/// Run the event command
pub async fn run_event(
    config: AppConfig,
    url: String,
    bookmaker: String,
    sport: Option<String>,
    static_html: bool,
    format: String,
) -> anyhow::Result<()> {
    let profile = find_profile(&bookmaker)?;
    let surface = open_surface(&config, &profile, static_html).await?;
    let scraper = build_scraper(&config, profile, surface.clone(), CancellationToken::new())?;

    let result = match sport {
        Some(s) => scraper.scrape_event_as(&url, s.parse()?).await,
        None => scraper.scrape_event(&url).await,
    };

    if let Err(e) = surface.close().await {
        tracing::warn!("Failed to close browsing surface: {}", e);
    }

    let event = result.with_context(|| format!("Failed to scrape {}", url))?;
    match format.as_str() {
        "json" => {
            let record = crate::storage::EventRecord::from(&event);
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        _ => print_events(std::slice::from_ref(&event)),
    }
    Ok(())
}

/// Run the sports command
pub fn run_sports(bookmaker: Option<String>) -> anyhow::Result<()> {
    let profiles = match bookmaker {
        Some(id) => vec![find_profile(&id)?],
        None => BookmakerProfile::builtin(),
    };

    for profile in profiles {
        println!("{} ({})", profile.bookmaker.name, profile.bookmaker.id);
        for (sport, path) in &profile.sport_paths {
            println!("  {:<14} {}", sport.as_str(), sport_url(&profile.bookmaker.base_url, path));
        }
        println!();
    }
    Ok(())
}

fn parse_sports(values: &[String]) -> anyhow::Result<Vec<SportType>> {
    values
        .iter()
        .map(|v| v.parse::<SportType>().map_err(anyhow::Error::from))
        .collect()
}

fn find_profile(id: &str) -> anyhow::Result<BookmakerProfile> {
    BookmakerProfile::find(id).with_context(|| {
        let known: Vec<_> = BookmakerProfile::builtin()
            .into_iter()
            .map(|p| p.bookmaker.id.clone())
            .collect();
        format!("Unknown bookmaker '{}' (known: {})", id, known.join(", "))
    })
}

async fn open_surface(
    config: &AppConfig,
    profile: &BookmakerProfile,
    static_html: bool,
) -> anyhow::Result<Arc<dyn BrowsingSurface>> {
    if profile.uses_browser && !static_html {
        eprintln!("Launching browser...");
        let surface = ChromeSurface::launch(&config.browser, config.scraper.settle()).await?;
        Ok(Arc::new(surface))
    } else {
        Ok(Arc::new(HttpSurface::new(&config.browser.user_agent)?))
    }
}

fn build_scraper(
    config: &AppConfig,
    profile: BookmakerProfile,
    surface: Arc<dyn BrowsingSurface>,
    cancel: CancellationToken,
) -> anyhow::Result<ConfiguredScraper> {
    let selectors = match &config.selectors.table_file {
        Some(path) => SelectorTable::builtin_with_overrides(path)
            .with_context(|| format!("Failed to load selector overrides from {}", path))?,
        None => SelectorTable::builtin(),
    };

    let mut controller = TraversalController::new(
        config.scraper.max_items,
        Pacer::new(config.scraper.pacing(), config.scraper.jitter()),
    )
    .with_cancellation(cancel)
    .with_observer(Arc::new(LoggingObserver));
    if let Some(dir) = &config.output.debug_dir {
        controller = controller.with_observer(Arc::new(DebugDumpObserver::new(dir)));
    }

    Ok(ConfiguredScraper::new(
        profile,
        Arc::new(selectors),
        surface,
        controller,
        config.scraper.navigation_timeout(),
    ))
}

/// Print events in a human readable layout
fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events found");
        return;
    }

    for event in events {
        println!("{}", "=".repeat(80));
        if event.sport() == SportType::HorseRacing {
            println!("EVENT: {} ({})", event.home_team(), event.competition());
        } else if event.away_team().is_empty() {
            println!("EVENT: {}", event.home_team());
        } else {
            println!("EVENT: {} vs {}", event.home_team(), event.away_team());
        }
        println!("{}", "=".repeat(80));
        println!("Sport: {}", event.sport());
        println!("Competition: {}", event.competition());
        if event.start_time_resolved() {
            println!("Start time: {}", event.start_time().format("%Y-%m-%d %H:%M UTC"));
        } else {
            println!("Start time: unknown");
        }
        println!("URL: {}", event.url());
        println!();

        for (i, market) in event.markets().iter().enumerate() {
            let live = if market.is_live() { " [LIVE]" } else { "" };
            println!("MARKET #{}: {} ({}){}", i + 1, market.name(), market.market_type(), live);
            println!("{}", "-".repeat(60));
            for outcome in market.outcomes() {
                println!("  {:<40} {:>8.2}", outcome.name(), outcome.odds());
            }
            println!();
        }
    }
}
