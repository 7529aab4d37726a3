//! Harvester main entry point
//!
//! Command-line interface for crawling judgment PDFs from the portal, with
//! graceful shutdown and resume.

use chrono::{Local, NaiveDate};
use clap::Parser;
use ecourts_harvester::captcha::{CommandRecognizer, TextRecognizer};
use ecourts_harvester::config::load_config_with_hash;
use ecourts_harvester::crawler::RunContext;
use ecourts_harvester::orchestrator::TaskOrchestrator;
use ecourts_harvester::{CourtRegistry, CrawlScheduler, CrawlTask};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Download judgment PDFs from the e-Courts portal
///
/// Crawls one date window at a time per court, resuming from the progress
/// file when no explicit start date is given. Interrupting a run is safe:
/// only fully paginated windows advance the recorded progress.
#[derive(Parser, Debug)]
#[command(name = "ecourts-harvester")]
#[command(version = "1.0.0")]
#[command(about = "CAPTCHA-gated judgment portal crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Comma-separated court codes, e.g. "9~13,27~1,19~16"
    #[arg(long, value_name = "CODES")]
    courts: String,

    /// Start date (YYYY-MM-DD); falls back to tracked progress
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Days per crawl window
    #[arg(long, default_value_t = 1)]
    step_days: u32,

    /// Parallel workers (courts crawled simultaneously)
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list planned windows without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let registry = CourtRegistry::load(&config.output.court_codes_path)?;
    tracing::info!("Court registry lists {} jurisdictions", registry.len());

    let codes: Vec<String> = cli
        .courts
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if codes.is_empty() {
        anyhow::bail!("--courts must name at least one court code");
    }

    let recognizer: Arc<dyn TextRecognizer> = Arc::new(CommandRecognizer::new(
        config.ocr.command.clone(),
        config.ocr.args.clone(),
    ));
    let ctx = Arc::new(RunContext::new(config, registry, recognizer, None)?);

    // Expand the requested span into per-window tasks, resuming from the
    // progress file where no explicit start is given.
    let progress = ctx.tracker.load().await?;
    let scheduler = CrawlScheduler::new(
        &ctx.registry,
        ctx.config.crawl.epoch_start,
        Local::now().date_naive(),
    );
    let tasks = scheduler.expand(
        &codes,
        cli.start_date,
        cli.end_date,
        cli.step_days,
        &progress,
    )?;

    if tasks.is_empty() {
        tracing::info!("Nothing to crawl: all requested courts are up to date");
        return Ok(());
    }

    if cli.dry_run {
        print_plan(&codes, &tasks);
        return Ok(());
    }

    // Let in-flight workers finish their current row, then stop. Progress
    // for unfinished windows is intentionally not advanced.
    let signal_ctx = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; letting workers wind down, progress is saved");
            signal_ctx.request_shutdown();
        }
    });

    let summary = TaskOrchestrator::new(ctx.clone(), cli.workers).run(tasks).await;

    if summary.failed > 0 {
        anyhow::bail!("{} task(s) failed; re-run to resume them", summary.failed);
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ecourts_harvester=info,warn"),
            1 => EnvFilter::new("ecourts_harvester=debug,info"),
            2 => EnvFilter::new("ecourts_harvester=trace,debug"),
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

/// Prints the planned windows for a dry run
fn print_plan(codes: &[String], tasks: &[CrawlTask]) {
    println!("=== Harvest Dry Run ===\n");
    println!("Courts: {}", codes.join(", "));
    println!("Planned windows: {}\n", tasks.len());
    for task in tasks {
        println!("  {} {}", task.court_code, task.window);
    }
    println!("\n✓ Configuration is valid");
}
