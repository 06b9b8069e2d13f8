//! valutatrade CLI - exchange rate cache commands
//!
//! ## Example Usage
//!
//! ```bash
//! # Refresh rates from every provider, or just one
//! valutatrade update-rates
//! valutatrade update-rates --source coingecko
//!
//! # Look up a cached rate
//! valutatrade get-rate --from BTC --to USD
//!
//! # List the cache
//! valutatrade show-rates --top 3
//! valutatrade show-rates --currency EUR
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use valutatrade::config::Settings;
use valutatrade::currency;
use valutatrade::data::sources::default_sources;
use valutatrade::data::{RateFilter, RateService, RatesUpdater, SnapshotStore};
use valutatrade::logging::{self, log_action};

/// valutatrade: multi-currency exchange rate cache
#[derive(Parser)]
#[command(name = "valutatrade")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exchange rate cache with pluggable price providers", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch fresh rates from the configured providers
    UpdateRates {
        /// Only run providers whose name starts with this (coingecko, exchangerate)
        #[arg(short = 's', long)]
        source: Option<String>,
    },

    /// Show the cached rate for one pair
    GetRate {
        /// Currency to convert from
        #[arg(long)]
        from: String,

        /// Currency to convert to
        #[arg(long)]
        to: String,
    },

    /// List cached rates
    ShowRates {
        /// Only pairs involving this currency
        #[arg(long)]
        currency: Option<String>,

        /// Only the N highest rates
        #[arg(long)]
        top: Option<usize>,

        /// Only pairs quoted in this currency
        #[arg(long)]
        base: Option<String>,
    },

    /// Show recorded observations for one pair
    History {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Maximum number of records
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// List supported currencies
    Currencies,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    if let Err(e) = logging::init(&settings) {
        eprintln!("{} {}", "Warning:".yellow(), e);
    }

    if cli.verbose {
        println!(
            "{} v{}",
            "valutatrade".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Data dir: {}",
            settings.data_dir.display().to_string().dimmed()
        );
    }

    let store = SnapshotStore::from_settings(&settings);

    let result = match cli.command {
        Commands::UpdateRates { source } => log_action("update-rates", || {
            update_rates(&settings, &store, source.as_deref(), cli.verbose)
        }),
        Commands::GetRate { from, to } => {
            log_action("get-rate", || get_rate(&settings, &store, &from, &to))
        }
        Commands::ShowRates {
            currency,
            top,
            base,
        } => show_rates(
            &settings,
            &store,
            RateFilter {
                currency,
                base,
                top,
            },
        ),
        Commands::History { from, to, limit } => show_history(&settings, &store, &from, &to, limit),
        Commands::Currencies => {
            show_currencies();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Show a spinner on stderr while `work` runs. Silent when not a TTY.
fn with_spinner<T>(msg: &str, work: impl FnOnce() -> T) -> T {
    let pb = if std::io::stderr().is_terminal() {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let out = work();
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    out
}

fn update_rates(
    settings: &Settings,
    store: &SnapshotStore,
    source: Option<&str>,
    verbose: bool,
) -> Result<()> {
    let mut updater = RatesUpdater::new(default_sources(settings)?, store)
        .with_merge_policy(settings.snapshot_merge);
    if let Some(filter) = source {
        updater = updater.only(filter)?;
    }

    if verbose {
        println!("Providers: {}", updater.source_names().join(", "));
    }

    let summary = with_spinner("Fetching exchange rates...", || updater.run_update())
        .context("rates update failed")?;

    for (source, count) in &summary.fetched {
        println!("  {} {}: {} rates", "✓".green().bold(), source, count);
    }
    for failure in &summary.failures {
        println!(
            "  {} {}: {}",
            "✗".red().bold(),
            failure.source,
            failure.reason.dimmed()
        );
    }

    if summary.updated == 0 {
        println!("{}", "No rates were updated.".yellow());
    } else {
        println!(
            "{} Updated {} pairs. Last refresh: {}",
            "✓".green().bold(),
            summary.updated.to_string().bright_green(),
            summary.last_refresh.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    if !summary.is_complete() {
        println!(
            "{}",
            "Some providers failed; see the log for details.".yellow()
        );
    }

    Ok(())
}

fn get_rate(settings: &Settings, store: &SnapshotStore, from: &str, to: &str) -> Result<()> {
    let service = RateService::from_settings(store, settings);
    let quote = service.get_rate(from, to)?;

    println!(
        "Rate {}→{}: {} (updated {}, {})",
        quote.pair.from_currency().bold(),
        quote.pair.to_currency().bold(),
        format!("{:.8}", quote.rate).bright_green(),
        quote.updated_at.format("%Y-%m-%d %H:%M:%S"),
        quote.source.dimmed()
    );
    let reverse = quote.pair.inverse();
    println!(
        "  Reverse {}→{}: {:.8}",
        reverse.from_currency(),
        reverse.to_currency(),
        quote.inverse_rate()
    );
    Ok(())
}

fn show_rates(settings: &Settings, store: &SnapshotStore, filter: RateFilter) -> Result<()> {
    let service = RateService::from_settings(store, settings);
    let listing = service.list_rates(&filter)?;

    match listing.last_refresh {
        Some(at) => println!(
            "{} (last refresh {})",
            "Cached rates".cyan().bold(),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => {
            println!(
                "{}",
                "Local rate cache is empty. Run 'update-rates' to load data.".yellow()
            );
            return Ok(());
        }
    }

    if listing.entries.is_empty() {
        println!("{}", "  No cached rates match the filter.".dimmed());
        return Ok(());
    }

    let now = chrono::Utc::now();
    for (pair, entry) in &listing.entries {
        let stale = entry.age(now) > service.ttl();
        let marker = if stale {
            " (stale)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  - {}: {:.8} {}{}",
            pair.to_string().bold(),
            entry.rate,
            entry.source.dimmed(),
            marker
        );
    }
    Ok(())
}

fn show_history(
    settings: &Settings,
    store: &SnapshotStore,
    from: &str,
    to: &str,
    limit: usize,
) -> Result<()> {
    let service = RateService::from_settings(store, settings);
    let records = service.history(from, to, Some(limit))?;

    if records.is_empty() {
        println!("{}", "No history recorded for this pair.".dimmed());
        return Ok(());
    }

    for record in &records {
        println!(
            "  {}  {:.8}  {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.rate,
            record.source.dimmed()
        );
    }
    Ok(())
}

fn show_currencies() {
    println!("{}", "Supported currencies".cyan().bold());
    for currency in currency::all() {
        println!("  {}", currency.display_info());
    }
}
