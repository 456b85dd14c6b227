//! Tablesweep main entry point
//!
//! This is the command-line interface for the Tablesweep table extractor.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tablesweep::config::{load_config_with_hash, Config};
use tablesweep::driver::HttpPageDriver;
use tablesweep::output::{load_statistics, print_statistics, print_summary};
use tablesweep::sink::open_sink;
use tablesweep::PaginationController;
use tracing_subscriber::EnvFilter;

/// Tablesweep: adaptive table extraction across paginated reports
///
/// Tablesweep finds the data table on each page of a paginated report, infers its
/// columns, keeps the rows that look like data, and commits every page to a SQLite
/// database as soon as it is read.
#[derive(Parser, Debug)]
#[command(name = "tablesweep")]
#[command(version)]
#[command(about = "Adaptive table extraction across paginated reports", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Re-commit pages already stored by earlier sessions of the same target
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be extracted without fetching anything
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show session statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        Ok(ExitCode::SUCCESS)
    } else if cli.stats {
        handle_stats(&config)?;
        Ok(ExitCode::SUCCESS)
    } else {
        handle_session(config, config_hash, cli.fresh).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tablesweep=info,warn"),
            1 => EnvFilter::new("tablesweep=debug,info"),
            2 => EnvFilter::new("tablesweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: prints the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Tablesweep Dry Run ===\n");

    println!("Source:");
    println!("  URL: {}", config.source.url);
    println!("  Page parameter: {}", config.source.page_param);
    println!("  User agent: {}", config.source.user_agent);
    if let Some(selector) = &config.source.next_selector {
        println!("  Next selector: {}", selector);
    }
    if let Some(pattern) = &config.source.total_pages_pattern {
        println!("  Total pages pattern: {}", pattern);
    }

    println!("\nExtraction:");
    println!("  Content markers: {}", config.extraction.content_markers.join(", "));
    println!("  Min table rows: {}", config.extraction.min_table_rows);
    println!("  Accept threshold: {}", config.extraction.accept_threshold);
    println!(
        "  Fallback columns: {}",
        config.extraction.fallback_columns.join(", ")
    );

    println!("\nPagination:");
    println!("  Stall threshold: {}", config.pagination.stall_threshold);
    println!(
        "  Navigation failure threshold: {}",
        config.pagination.navigation_failure_threshold
    );
    println!("  Max pages: {}", config.pagination.max_pages);
    println!(
        "  Retries: {} fetch, {} navigation, {}ms apart",
        config.pagination.fetch_retries,
        config.pagination.navigation_retries,
        config.pagination.retry_backoff_ms
    );

    println!("\nReadiness:");
    println!(
        "  {} poll(s) every {}ms, tables over {} rows",
        config.readiness.max_attempts, config.readiness.poll_interval_ms, config.readiness.min_rows
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let sink = open_sink(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&sink)?;
    print_statistics(&stats);

    Ok(())
}

/// Runs one session against the configured source
async fn handle_session(
    config: Config,
    config_hash: String,
    fresh: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh session (ignoring previously committed pages)");
    } else {
        tracing::info!("Starting session (pages committed earlier will be skipped)");
    }

    let driver = HttpPageDriver::new(&config.source)?;
    let sink = open_sink(Path::new(&config.output.database_path))?;

    let mut controller = PaginationController::new(driver, sink, &config)
        .with_config_hash(config_hash)
        .with_resume(!fresh);

    let token = controller.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            token.cancel();
        }
    });

    let summary = match controller.run(&config.source.url).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Session aborted: {}", e);
            return Err(e.into());
        }
    };

    print_summary(&summary);

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
