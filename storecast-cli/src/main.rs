//! Storecast CLI: predict, history, and config commands.
//!
//! Commands:
//! - `predict`: forecast N months and print the consolidated table and summaries
//! - `history`: show each category's historical data source
//! - `check-config`: validate a pipeline config and the model artifacts it names

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use storecast_core::model::ModelArtifact;
use storecast_core::{calendar, AlignmentPolicy, Category};
use storecast_runner::{
    export_json, save_artifacts, DashboardReport, ForecastPipeline, ForecastSession,
    PipelineConfig,
};
use tracing_subscriber::EnvFilter;

/// Horizon used with `--demo` when `--months` is not given.
const DEMO_DEFAULT_HORIZON: usize = 6;

#[derive(Parser)]
#[command(
    name = "storecast",
    about = "Storecast CLI: per-category sales forecasts on one monthly calendar"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum AlignmentArg {
    Union,
    Intersection,
}

impl From<AlignmentArg> for AlignmentPolicy {
    fn from(arg: AlignmentArg) -> Self {
        match arg {
            AlignmentArg::Union => AlignmentPolicy::Union,
            AlignmentArg::Intersection => AlignmentPolicy::Intersection,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Forecast the next N months for every category.
    Predict {
        /// Number of months to forecast. Defaults to the config's default_horizon.
        #[arg(long)]
        months: Option<usize>,

        /// Path to a TOML pipeline config.
        #[arg(long, conflicts_with = "demo")]
        config: Option<PathBuf>,

        /// Use synthetic histories and built-in demo models.
        #[arg(long, default_value_t = false)]
        demo: bool,

        /// Override the configured alignment policy.
        #[arg(long, value_enum)]
        alignment: Option<AlignmentArg>,

        /// Save report.json, forecast.csv, summary.csv, and report.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the report as JSON instead of tables.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show each category's historical data.
    History {
        /// Path to a TOML pipeline config.
        #[arg(long, conflicts_with = "demo")]
        config: Option<PathBuf>,

        /// Use synthetic histories.
        #[arg(long, default_value_t = false)]
        demo: bool,

        /// Print the last N observations per category.
        #[arg(long)]
        tail: Option<usize>,
    },
    /// Parse and validate a pipeline config and its model artifacts.
    CheckConfig {
        /// Path to a TOML pipeline config.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Predict {
            months,
            config,
            demo,
            alignment,
            output_dir,
            json,
        } => run_predict(
            months,
            config.as_deref(),
            demo,
            alignment.map(Into::into),
            output_dir.as_deref(),
            json,
        ),
        Commands::History { config, demo, tail } => run_history(config.as_deref(), demo, tail),
        Commands::CheckConfig { config } => run_check_config(&config),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the pipeline from `--config` or `--demo` and return it with its default horizon.
fn build_pipeline(config: Option<&Path>, demo: bool) -> Result<(ForecastPipeline, usize)> {
    match (config, demo) {
        (Some(path), false) => {
            let config = PipelineConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            let pipeline = ForecastPipeline::from_config(&config)?;
            Ok((pipeline, config.pipeline.default_horizon))
        }
        (None, true) => Ok((
            ForecastPipeline::demo(AlignmentPolicy::default())?,
            DEMO_DEFAULT_HORIZON,
        )),
        (Some(_), true) => bail!("--config and --demo are mutually exclusive"),
        (None, false) => bail!("one of --config or --demo is required"),
    }
}

fn run_predict(
    months: Option<usize>,
    config: Option<&Path>,
    demo: bool,
    alignment: Option<AlignmentPolicy>,
    output_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let (mut pipeline, default_horizon) = build_pipeline(config, demo)?;
    if let Some(policy) = alignment {
        pipeline.set_policy(policy);
    }
    let horizon = months.unwrap_or(default_horizon);
    if horizon == 0 {
        bail!("--months must be at least 1");
    }

    tracing::info!(horizon, policy = ?pipeline.policy(), "starting prediction");
    let session = ForecastSession::new(pipeline);
    let report = session.predict(horizon)?;

    if json {
        println!("{}", export_json(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, dir)?;
        // Keep stdout a clean JSON document in --json mode.
        if json {
            eprintln!("Artifacts saved to: {}", run_dir.display());
        } else {
            println!("Artifacts saved to: {}", run_dir.display());
        }
    }
    Ok(())
}

fn run_history(config: Option<&Path>, demo: bool, tail: Option<usize>) -> Result<()> {
    let (pipeline, _) = build_pipeline(config, demo)?;
    let histories = pipeline.load_histories()?;

    println!();
    println!("=== Data Sources ===");
    println!(
        "{:<16} {:>6} {:<12} {:<12} {:>14}",
        "Category", "Rows", "First", "Last", "Total Sales"
    );
    println!("{}", "-".repeat(64));
    for series in &histories {
        let first = series.first_date().map(|d| d.to_string());
        let last = series.last_date().map(|d| d.to_string());
        let total = series.points().iter().fold(0.0, |acc, p| acc + p.sales);
        println!(
            "{:<16} {:>6} {:<12} {:<12} {:>14.2}",
            series.category().display_name(),
            series.len(),
            first.as_deref().unwrap_or("-"),
            last.as_deref().unwrap_or("-"),
            total
        );
    }

    if let Some(n) = tail {
        for series in &histories {
            println!();
            println!("--- {} (last {n}) ---", series.category().display_name());
            for point in series.tail(n) {
                println!("{:<12} {:>12.2}", point.date.to_string(), point.sales);
            }
        }
    }
    if demo {
        println!();
        println!("WARNING: SYNTHETIC data");
    }
    println!();
    Ok(())
}

fn run_check_config(path: &Path) -> Result<()> {
    let config = PipelineConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))?;

    println!("Config:           {}", path.display());
    println!("Alignment:        {:?}", config.pipeline.alignment);
    println!("Model timeout:    {}s", config.pipeline.model_timeout_secs);
    println!("Default horizon:  {} months", config.pipeline.default_horizon);
    println!();

    let mut problems = 0;
    for category in Category::ALL {
        let history = config.history_path(category);
        let model = config.model_path(category);
        let columns = config.columns_for(category);
        println!("[{}]", category.display_name());
        println!(
            "  history:  {} ({}){}",
            history.display(),
            format_columns(&columns.date, &columns.sales),
            if history.exists() { "" } else { "  MISSING" }
        );
        if !history.exists() {
            problems += 1;
        }
        match ModelArtifact::from_file(&model) {
            Ok(artifact) => println!(
                "  model:    {} -> {} ({:?})",
                model.display(),
                artifact.name,
                artifact.interface
            ),
            Err(e) => {
                problems += 1;
                println!("  model:    {}  INVALID: {e}", model.display());
            }
        }
    }
    println!();

    if problems > 0 {
        bail!("{problems} problem(s) found in {}", path.display());
    }
    println!("Config OK");
    Ok(())
}

fn format_columns(date: &str, sales: &str) -> String {
    format!("date=\"{date}\", sales=\"{sales}\"")
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

fn print_report(report: &DashboardReport) {
    println!();
    println!("=== Sales Forecast ===");
    println!("Horizon:        {} months", report.horizon);
    println!("Alignment:      {:?}", report.alignment);
    println!("Dataset Hash:   {}", report.dataset_hash);
    println!();

    println!("--- Models ---");
    println!(
        "{:<16} {:<20} {:<11} {:<13} {}",
        "Category", "Model", "Interface", "Last Obs.", "Window"
    );
    for c in &report.categories {
        println!(
            "{:<16} {:<20} {:<11} {:<13} {} .. {}",
            c.category.display_name(),
            c.model,
            format!("{:?}", c.interface),
            c.last_observed.to_string(),
            calendar::month_label(c.window.start()),
            calendar::month_label(c.window.end())
        );
    }
    println!();

    println!("--- Forecast ---");
    print!("{:<10}", "Month");
    for c in Category::ALL {
        print!(" {:>16}", c.display_name());
    }
    println!();
    println!("{}", "-".repeat(10 + 17 * Category::ALL.len()));
    for row in report.table.rows() {
        print!("{:<10}", calendar::month_label(row.date));
        for c in Category::ALL {
            print!(" {:>16}", cell(row.get(c)));
        }
        println!();
    }
    println!();

    println!("--- Totals ---");
    println!("{:<16} {:>14} {:>8}", "Category", "Total", "Share");
    for c in Category::ALL {
        println!(
            "{:<16} {:>14.2} {:>7.1}%",
            c.display_name(),
            report.totals.get(&c).copied().unwrap_or(0.0),
            report.shares.get(&c).copied().unwrap_or(0.0) * 100.0
        );
    }
    println!("{:<16} {:>14.2}", "All", report.grand_total());
    println!();

    println!("--- Highest / Lowest Month ---");
    for s in &report.summaries {
        match &s.extrema {
            Some(e) => println!(
                "{:<16} high {} ({:.2})  low {} ({:.2})",
                s.category.display_name(),
                calendar::month_label(e.max_date),
                e.max_value,
                calendar::month_label(e.min_date),
                e.min_value
            ),
            None => println!("{:<16} no forecast values", s.category.display_name()),
        }
    }
    println!();

    println!("--- Distribution ---");
    println!(
        "{:<16} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "Category", "Min", "Q1", "Median", "Q3", "Max", "Mean"
    );
    for s in &report.summaries {
        let d = s.distribution.as_ref();
        println!(
            "{:<16} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
            s.category.display_name(),
            cell(d.map(|d| d.min)),
            cell(d.map(|d| d.q1)),
            cell(d.map(|d| d.median)),
            cell(d.map(|d| d.q3)),
            cell(d.map(|d| d.max)),
            cell(d.map(|d| d.mean))
        );
    }

    for s in &report.summaries {
        if s.months_absent > 0 {
            println!();
            println!(
                "NOTE: {} has {} absent month(s) (shown as '-')",
                s.category.display_name(),
                s.months_absent
            );
        }
    }
    if report.has_synthetic {
        println!();
        println!("WARNING: Forecast based on SYNTHETIC data");
    }
    println!();
}
