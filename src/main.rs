//! timereport - Azure DevOps time tracking exporter
//!
//! A CLI tool that runs a saved work-item query, expands parent/child
//! hierarchy relations, fetches 7pace Timetracker worklogs for the
//! whole id set, rolls child time up into parent buckets by activity
//! category, and writes a semicolon-delimited CSV export.
//!
//! Exit codes:
//!   0 - Successful export (also --dry-run and --init-config)
//!   1 - Runtime error (config, transport, malformed response, I/O)
//!   2 - The saved query returned no work items (nothing to report)

mod analysis;
mod azdo;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod timehub;

use anyhow::{Context, Result};
use chrono::Local;
use cli::Args;
use config::Config;
use error::ExportError;
use indicatif::{ProgressBar, ProgressStyle};
use models::{Hierarchy, Ticket};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("timereport v{}", env!("CARGO_PKG_VERSION"));

    // Run the export
    match run_export(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if matches!(e.downcast_ref::<ExportError>(), Some(ExportError::EmptyQueryResult)) {
                warn!("{}", e);
                eprintln!("⚠️  No work items matched the saved query. Nothing to report.");
                std::process::exit(2);
            }
            error!("Export failed: {}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .timereport.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".timereport.toml");

    if path.exists() {
        eprintln!("⚠️  .timereport.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .timereport.toml")?;

    println!("✅ Created .timereport.toml with default settings.");
    println!("   Edit it to set endpoints and activity names; keep tokens in the environment.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete export workflow.
async fn run_export(args: Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;

    let timeout = Duration::from_secs(config.general.timeout_seconds);
    let azdo = azdo::AzdoClient::new(&config.azdo, timeout)?;

    // Step 1: run the saved query
    println!("🔎 Running saved query {}...", config.azdo.query_id);
    let ids = azdo.run_saved_query().await?;
    info!("Query matched {} work items", ids.len());

    // Step 2: expand fields and hierarchy relations
    println!("📦 Expanding {} work items...", ids.len());
    let (tickets, hierarchy) = expand_work_items(&azdo, &ids, !args.quiet).await?;
    let child_ids = hierarchy.all_children();
    info!(
        "Found {} child links under {} work items",
        hierarchy.edge_count(),
        tickets.len()
    );

    // Handle --dry-run: show what would be exported and stop
    if args.dry_run {
        return handle_dry_run(&tickets, &hierarchy);
    }

    // Step 3: fetch worklogs for parents and children together
    let timehub = timehub::TimeHubClient::new(&config.timehub, timeout)?;
    let mut all_ids = ids;
    all_ids.extend(child_ids);

    println!("🔎 Querying time logs for {} work items...", all_ids.len());
    let worklogs = timehub.fetch_worklogs(&all_ids).await?;
    println!("✅ {} worklogs retrieved", worklogs.len());

    // Step 4: roll time up into per-ticket buckets
    let buckets =
        analysis::aggregate_worklogs(&tickets, &hierarchy, &worklogs, &config.activities);

    // Step 5: write the CSV
    let filename = report::export_filename(Local::now());
    let path = PathBuf::from(&config.report.output_dir).join(filename);
    report::write_report(&path, &tickets, &buckets)?;

    println!("✅ Export complete: {}", path.display());
    Ok(())
}

/// Fetch every work item sequentially, collecting tickets and
/// parent→child edges.
async fn expand_work_items(
    client: &azdo::AzdoClient,
    ids: &[String],
    show_progress: bool,
) -> Result<(Vec<Ticket>, Hierarchy)> {
    let progress_bar = if show_progress {
        let pb = ProgressBar::new(ids.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut tickets = Vec::with_capacity(ids.len());
    let mut hierarchy = Hierarchy::default();

    for id in ids {
        let detail = client.fetch_work_item(id).await?;
        debug!("Work item {}: {} children", id, detail.child_ids.len());

        for child in &detail.child_ids {
            hierarchy.add_edge(id, child);
        }
        tickets.push(detail.ticket);

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    Ok((tickets, hierarchy))
}

/// Handle --dry-run: print what would be exported, skip the time-log
/// call, write no file.
fn handle_dry_run(tickets: &[Ticket], hierarchy: &Hierarchy) -> Result<()> {
    println!("\n🔍 Dry run: no worklogs fetched, no file written.\n");

    for ticket in tickets {
        println!("  📄 {}: {} [{}]", ticket.id, ticket.title, ticket.state);
    }

    println!(
        "\n  Total: {} work items, {} child links",
        tickets.len(),
        hierarchy.edge_count()
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .timereport.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
