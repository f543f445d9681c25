//! rexport CLI
//!
//! Local entry point for ingesting, merging and inspecting export snapshots.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use rexport::{
    error::{AppError, Result},
    models::{Category, Config, RecordView},
    pipeline::{self, StructuralComparator},
    services::Dal,
    storage::{LocalStorage, SnapshotStorage, WriteOutcome},
};
use serde_json::Value;

/// rexport - Reddit export reconciliation
#[derive(Parser, Debug)]
#[command(name = "rexport", version, about = "Merge and inspect Reddit data exports")]
struct Cli {
    /// Directory holding snapshot files
    #[arg(short, long, default_value = "exports")]
    storage_dir: PathBuf,

    /// Config file (default: {storage_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Annotate a freshly fetched export and store it unless redundant
    Ingest {
        /// Export JSON produced by the API client
        file: PathBuf,
        /// Write even when identical to the latest snapshot
        #[arg(long)]
        force: bool,
    },

    /// Add first-export stamps to an export using a previous one
    Annotate {
        #[arg(long)]
        current: PathBuf,
        /// Previous export (default: latest stored snapshot)
        #[arg(long)]
        previous: Option<PathBuf>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare two exports, ignoring volatile fields
    Compare { left: PathBuf, right: PathBuf },

    /// Print the merged records of a category as JSON lines
    Merge { category: Category },

    /// Show recent comments and the most saved subreddits
    Summary {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Show stored snapshot info
    Info,

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

fn write_document(path: Option<&Path>, document: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    match path {
        Some(path) => {
            std::fs::write(path, json)?;
            log::info!("Saved data to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.storage_dir.join("config.toml"));
    let config = Config::load_or_default(&config_path)?;
    init_logging(cli.verbose, &config.logging.level);
    let storage = LocalStorage::with_config(&cli.storage_dir, &config);

    match cli.command {
        Command::Ingest { file, force } => {
            let export = read_document(&file)?;
            let report = pipeline::run_ingest(&config, &storage, &export, Utc::now(), force).await?;
            match report.outcome {
                WriteOutcome::Written { name } => log::info!("Stored export as {name}"),
                WriteOutcome::Skipped { redundant_with } => {
                    log::info!("Export discarded, same as {redundant_with}")
                }
            }
        }

        Command::Annotate {
            current,
            previous,
            output,
        } => {
            let current = read_document(&current)?;
            let previous = match previous {
                Some(path) => Some(read_document(&path)?),
                None => storage.latest().await?.map(|s| s.into_document()),
            };
            if previous.is_none() {
                log::warn!("No previous export available, output is left unannotated");
            }

            let (annotated, stats) =
                pipeline::infer_first_exported(&current, previous.as_ref(), Utc::now());
            log::info!(
                "{} stamped, {} carried, {} unknown",
                stats.stamped,
                stats.carried,
                stats.unknown
            );
            write_document(output.as_deref(), &annotated)?;
        }

        Command::Compare { left, right } => {
            let (left, right) = (read_document(&left)?, read_document(&right)?);
            let comparison = StructuralComparator::from_config(&config.compare).compare(&left, &right)?;
            pipeline::diff_exports(&left, &right).log_summary();

            for difference in &comparison.differences {
                println!("{}", serde_json::to_string(difference)?);
            }
            if !comparison.is_equal() {
                return Err(AppError::validation(format!(
                    "Exports differ at {} paths",
                    comparison.differences.len()
                )));
            }
            log::info!("Exports are equal");
        }

        Command::Merge { category } => {
            let dal = Dal::load(&storage).await?;
            let records = dal.raw(category)?;
            log::info!(
                "{} unique {} records across {} snapshots",
                records.len(),
                category,
                dal.snapshots().len()
            );
            for record in records {
                println!("{}", serde_json::to_string(record)?);
            }
        }

        Command::Summary { limit } => {
            let dal = Dal::load(&storage).await?;

            if let Some(profile) = dal.profile()? {
                println!(
                    "{}: {} link karma, {} comment karma",
                    profile.name()?,
                    profile.link_karma()?,
                    profile.comment_karma()?
                );
            }

            println!("Your comments:");
            let comments = dal.comments()?;
            for comment in comments.iter().rev().take(limit) {
                println!("{} {}", comment.created()?, comment.url()?);
                for line in comment.text()?.lines() {
                    println!(" |  {line}");
                }
                println!();
            }

            println!("Your most saved subreddits:");
            for (name, count) in dal.most_saved_subreddits(limit)? {
                println!("    {name}: {count}");
            }
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            let snapshots = storage.list().await?;
            match (snapshots.first(), snapshots.last()) {
                (Some(first), Some(last)) => {
                    log::info!("{} snapshots stored", snapshots.len());
                    log::info!("Oldest: {}", first.name);
                    log::info!("Newest: {}", last.name);
                    let undated = snapshots.iter().filter(|s| s.captured_at.is_none()).count();
                    if undated > 0 {
                        log::warn!("{undated} snapshots have no capture stamp in their name");
                    }
                }
                _ => log::info!("No snapshots found yet."),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            if !cli.storage_dir.is_dir() {
                return Err(AppError::config(format!(
                    "Storage directory {} does not exist",
                    cli.storage_dir.display()
                )));
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
