//! Storecast Runner: forecast orchestration on top of `storecast-core`.
//!
//! This crate provides:
//! - TOML pipeline configuration
//! - History sources (CSV, in-memory, synthetic demo data)
//! - The pipeline entry point with per-model wall-clock timeouts
//! - A single-flight session where a new prediction supersedes the old one
//! - Dashboard reports and JSON/CSV/Markdown export

pub mod config;
pub mod export;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod source;
pub mod synthetic;

pub use config::{CategorySource, CategorySources, ConfigError, PipelineConfig, PipelineSettings};
pub use export::{
    export_json, export_summary_csv, export_table_csv, generate_report, import_json,
    load_artifacts, save_artifacts,
};
pub use pipeline::{
    forecast_with_timeout, CategoryRun, ForecastPipeline, ForecastRun, PipelineError,
    PipelineErrorKind, Stage, DEFAULT_MODEL_TIMEOUT,
};
pub use report::{DashboardReport, SCHEMA_VERSION};
pub use session::{CancelToken, ForecastSession, PredictHandle};
pub use source::{CsvHistory, HistorySource, StaticHistory, SyntheticHistory};
pub use synthetic::{demo_artifact, generate_synthetic_history};
