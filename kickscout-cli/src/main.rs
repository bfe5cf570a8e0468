//! KickScout CLI: daily reports, prediction previews and config checks.
//!
//! Commands:
//! - `report`: predict, reconcile squad and market, write artifacts
//! - `predict`: score the reporting day and print the top rows
//! - `check-config`: validate config, model and snapshot without running

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kickscout_core::clock::reporting_date;
use kickscout_core::data::{load_snapshot, snapshot_fingerprint, JsonDirProvider};
use kickscout_core::export::save_reports;
use kickscout_core::schema::columns::MV;
use kickscout_core::schema::has_column;
use kickscout_core::{
    Clock, DailyPipeline, DailyReports, FixedClock, LinearModel, ScoutConfig, SystemClock,
    ValuePredictor,
};
use polars::prelude::DataFrame;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kickscout",
    about = "KickScout: market-value predictions reconciled against squad and market"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full daily pipeline and write report artifacts.
    Report {
        /// Path to the scout TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Pin the clock (RFC 3339, or local `YYYY-MM-DDTHH:MM:SS` in Europe/Berlin).
        #[arg(long)]
        now: Option<String>,

        /// Output directory. Defaults to the config's `output_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Score the reporting day and print the ranked prediction table.
    Predict {
        /// Path to the scout TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Pin the clock (RFC 3339, or local `YYYY-MM-DDTHH:MM:SS` in Europe/Berlin).
        #[arg(long)]
        now: Option<String>,

        /// Number of rows to print.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Validate the config, model and snapshot schema.
    CheckConfig {
        /// Path to the scout TOML config.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            config,
            now,
            output_dir,
        } => run_report(&config, now.as_deref(), output_dir),
        Commands::Predict { config, now, limit } => run_predict(&config, now.as_deref(), limit),
        Commands::CheckConfig { config } => run_check_config(&config),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,kickscout=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn make_clock(now: Option<&str>) -> Result<Box<dyn Clock>> {
    match now {
        Some(input) => match FixedClock::parse(input) {
            Some(clock) => Ok(Box::new(clock)),
            None => bail!(
                "invalid --now '{input}': expected RFC 3339 or YYYY-MM-DDTHH:MM:SS (Europe/Berlin)"
            ),
        },
        None => Ok(Box::new(SystemClock)),
    }
}

/// Config, model and snapshot, loaded together since every command needs them.
struct Inputs {
    config: ScoutConfig,
    model: LinearModel,
    snapshot: DataFrame,
}

fn load_inputs(config_path: &Path) -> Result<Inputs> {
    let config = ScoutConfig::from_file(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let model = LinearModel::from_file(&config.model)
        .with_context(|| format!("loading model {}", config.model.display()))?;
    let snapshot = load_snapshot(&config.snapshot)
        .with_context(|| format!("loading snapshot {}", config.snapshot.display()))?;
    debug!(league = %config.league_id, model = model.name(), "inputs loaded");
    Ok(Inputs {
        config,
        model,
        snapshot,
    })
}

fn run_report(config_path: &Path, now: Option<&str>, output_dir: Option<PathBuf>) -> Result<()> {
    let Inputs {
        config,
        model,
        snapshot,
    } = load_inputs(config_path)?;
    let clock = make_clock(now)?;
    let provider = JsonDirProvider::new(&config.payload_dir);

    let pipeline = DailyPipeline::new(
        &model,
        &config.features,
        &provider,
        &provider,
        clock.as_ref(),
    );
    let reports = pipeline
        .run(&snapshot, &config.token(), &config.league_id)
        .context("daily run failed")?;

    print_summary(&config, &reports);
    println!("--- Squad ---");
    println!("{}", reports.squad);
    println!();
    println!("--- Market ---");
    println!("{}", reports.market);
    println!();

    let snapshot_hash = snapshot_fingerprint(&config.snapshot)
        .with_context(|| format!("hashing snapshot {}", config.snapshot.display()))?;
    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    let report_dir = save_reports(&reports, &output_dir, &snapshot_hash)
        .with_context(|| format!("writing reports to {}", output_dir.display()))?;
    println!("Artifacts saved to: {}", report_dir.display());

    Ok(())
}

fn run_predict(config_path: &Path, now: Option<&str>, limit: usize) -> Result<()> {
    let Inputs {
        config,
        model,
        snapshot,
    } = load_inputs(config_path)?;
    let clock = make_clock(now)?;
    let provider = JsonDirProvider::new(&config.payload_dir);

    let pipeline = DailyPipeline::new(
        &model,
        &config.features,
        &provider,
        &provider,
        clock.as_ref(),
    );
    let (day, predictions) = pipeline
        .predictions(&snapshot)
        .context("prediction failed")?;

    println!();
    println!("=== Predictions ===");
    println!("Reporting date: {day}");
    println!("Model:          {}", model.name());
    println!("Rows:           {}", predictions.height());
    println!();
    println!("{}", predictions.head(Some(limit)));

    Ok(())
}

fn run_check_config(config_path: &Path) -> Result<()> {
    let Inputs {
        config,
        model,
        snapshot,
    } = load_inputs(config_path)?;

    let configured: BTreeSet<&str> = config.features.iter().map(String::as_str).collect();
    let fitted: BTreeSet<&str> = model.feature_names().into_iter().collect();
    let missing_in_model: Vec<_> = configured.difference(&fitted).collect();
    let missing_in_config: Vec<_> = fitted.difference(&configured).collect();
    if !missing_in_model.is_empty() || !missing_in_config.is_empty() {
        bail!(
            "model '{}' does not match configured features (no coefficient for {:?}; not configured: {:?})",
            model.name(),
            missing_in_model,
            missing_in_config
        );
    }

    let mut required: Vec<&str> = vec![MV];
    required.extend(config.features.iter().map(String::as_str));
    let absent: Vec<&str> = required
        .into_iter()
        .filter(|name| !has_column(&snapshot, name))
        .collect();
    if !absent.is_empty() {
        bail!(
            "snapshot {} is missing columns: {}",
            config.snapshot.display(),
            absent.join(", ")
        );
    }

    let league_dir = config.payload_dir.join(&config.league_id);
    for file in [JsonDirProvider::SQUAD_FILE, JsonDirProvider::MARKET_FILE] {
        if !league_dir.join(file).exists() {
            warn!(path = %league_dir.join(file).display(), "payload not captured yet");
        }
    }

    let today = reporting_date(&SystemClock.now());
    println!("Config OK: {}", config_path.display());
    println!("League:         {}", config.league_id);
    println!("Model:          {} ({} features)", model.name(), config.features.len());
    println!(
        "Snapshot:       {} ({} rows, {} columns)",
        config.snapshot.display(),
        snapshot.height(),
        snapshot.width()
    );
    println!("Reporting date: {today} (if run now)");
    Ok(())
}

fn print_summary(config: &ScoutConfig, reports: &DailyReports) {
    println!();
    println!("=== Daily Report ===");
    println!("League:         {}", config.league_id);
    println!("Reporting date: {}", reports.reporting_date);
    println!("Generated at:   {}", reports.generated_at.to_rfc3339());
    println!("Model:          {}", reports.model_name);
    println!();
    println!("--- Rows ---");
    println!("Predictions:    {}", reports.predictions.height());
    println!("Squad:          {}", reports.squad.height());
    println!("Market:         {}", reports.market.height());
    if reports.squad.height() == 0 {
        println!();
        println!("WARNING: no squad player matched the prediction table");
    }
    println!();
}
