//! The forecast pipeline: histories → windows → adapters → consolidated table.
//!
//! Every run rebuilds everything from the sources. Model calls run on a named
//! helper thread so the caller can enforce a wall-clock timeout; a timeout or
//! any other model failure for one category aborts the whole run and no
//! partial table is returned.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

use storecast_core::data::DataError;
use storecast_core::model::ModelInterface;
use storecast_core::{
    adapter_from_artifact, merge, resolve, AdapterError, AlignError, AlignmentPolicy, Category,
    ConsolidatedTable, ForecastAdapter, ForecastWindow, HistoricalSeries, HorizonError,
    ModelError, NormalizedForecast,
};

use crate::config::{ConfigError, PipelineConfig};
use crate::session::CancelToken;
use crate::source::{CsvHistory, HistorySource, SyntheticHistory};
use crate::synthetic::{demo_artifact, demo_origin, DEMO_MONTHS};

/// Default per-model wall-clock limit.
pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Errors ─────────────────────────────────────────────────────────

/// Pipeline stage at which a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    LoadHistory,
    ResolveHorizon,
    Forecast,
    Align,
    Superseded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::LoadHistory => "load history",
            Stage::ResolveHorizon => "resolve horizon",
            Stage::Forecast => "forecast",
            Stage::Align => "align",
            Stage::Superseded => "superseded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineErrorKind {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Horizon(#[from] HorizonError),

    #[error(transparent)]
    Forecast(#[from] AdapterError),

    #[error(transparent)]
    Align(#[from] AlignError),

    #[error("run superseded by a newer request")]
    Superseded,

    #[error("pipeline worker exited without a result")]
    WorkerLost,
}

/// A failed run, with the horizon, category, and stage it failed at.
#[derive(Debug, Error)]
#[error("{stage} failed{} (horizon {horizon}): {kind}", describe_category(.category))]
pub struct PipelineError {
    pub horizon: usize,
    pub category: Option<Category>,
    pub stage: Stage,
    #[source]
    pub kind: PipelineErrorKind,
}

fn describe_category(category: &Option<Category>) -> String {
    match category {
        Some(c) => format!(" for {c}"),
        None => String::new(),
    }
}

impl PipelineError {
    pub fn new(
        horizon: usize,
        category: Option<Category>,
        stage: Stage,
        kind: impl Into<PipelineErrorKind>,
    ) -> Self {
        Self {
            horizon,
            category,
            stage,
            kind: kind.into(),
        }
    }

    pub(crate) fn superseded(horizon: usize) -> Self {
        Self::new(horizon, None, Stage::Superseded, PipelineErrorKind::Superseded)
    }

    pub fn is_superseded(&self) -> bool {
        self.stage == Stage::Superseded
    }

    /// True when a model could not produce a forecast (failure, timeout, abort).
    pub fn is_forecast_unavailable(&self) -> bool {
        matches!(
            self.kind,
            PipelineErrorKind::Forecast(AdapterError::Unavailable { .. })
        )
    }
}

// ─── Run result ─────────────────────────────────────────────────────

/// Provenance of one category's forecast within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRun {
    pub category: Category,
    pub source: String,
    pub model: String,
    pub interface: ModelInterface,
    pub history_rows: usize,
    pub last_observed: NaiveDate,
    pub window: ForecastWindow,
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub horizon: usize,
    pub policy: AlignmentPolicy,
    pub categories: Vec<CategoryRun>,
    pub forecasts: Vec<NormalizedForecast>,
    pub table: ConsolidatedTable,
    /// BLAKE3 over the histories used, in column order.
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub elapsed: Duration,
}

// ─── Pipeline ───────────────────────────────────────────────────────

struct CategoryInput {
    source: Box<dyn HistorySource>,
    adapter: Arc<dyn ForecastAdapter>,
}

/// Configured pipeline: one history source and one model adapter per category.
pub struct ForecastPipeline {
    inputs: Vec<CategoryInput>,
    policy: AlignmentPolicy,
    model_timeout: Duration,
}

impl ForecastPipeline {
    pub fn new(policy: AlignmentPolicy, model_timeout: Duration) -> Self {
        Self {
            inputs: Vec::new(),
            policy,
            model_timeout,
        }
    }

    /// Register a category. A category registered twice fails the align stage.
    pub fn add_category(
        &mut self,
        source: impl HistorySource + 'static,
        adapter: Arc<dyn ForecastAdapter>,
    ) -> &mut Self {
        self.inputs.push(CategoryInput {
            source: Box::new(source),
            adapter,
        });
        self
    }

    pub fn with_category(
        mut self,
        source: impl HistorySource + 'static,
        adapter: Arc<dyn ForecastAdapter>,
    ) -> Self {
        self.add_category(source, adapter);
        self
    }

    /// CSV histories and artifact-backed models as described by `config`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let mut pipeline = Self::new(config.pipeline.alignment, config.model_timeout());
        for category in Category::ALL {
            let model_path = config.model_path(category);
            let adapter = storecast_core::model::ModelArtifact::from_file(&model_path)
                .and_then(|artifact| adapter_from_artifact(&artifact))
                .map_err(|source| ConfigError::Model { category, source })?;
            let source = CsvHistory::new(
                category,
                config.history_path(category),
                config.columns_for(category).clone(),
            );
            tracing::debug!(
                %category,
                model = adapter.model_name(),
                history = %source.describe(),
                "registered category"
            );
            pipeline.add_category(source, adapter);
        }
        Ok(pipeline)
    }

    /// Synthetic histories and built-in demo models for all three categories.
    pub fn demo(policy: AlignmentPolicy) -> Result<Self, ConfigError> {
        let mut pipeline = Self::new(policy, DEFAULT_MODEL_TIMEOUT);
        for category in Category::ALL {
            let adapter = adapter_from_artifact(&demo_artifact(category))
                .map_err(|source| ConfigError::Model { category, source })?;
            pipeline.add_category(
                SyntheticHistory::new(category, demo_origin(), DEMO_MONTHS),
                adapter,
            );
        }
        Ok(pipeline)
    }

    pub fn policy(&self) -> AlignmentPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: AlignmentPolicy) {
        self.policy = policy;
    }

    pub fn model_timeout(&self) -> Duration {
        self.model_timeout
    }

    pub fn categories(&self) -> Vec<Category> {
        self.inputs.iter().map(|i| i.source.category()).collect()
    }

    /// Load every history without forecasting (the data source view).
    pub fn load_histories(&self) -> Result<Vec<HistoricalSeries>, PipelineError> {
        self.inputs
            .iter()
            .map(|input| {
                let category = input.source.category();
                input
                    .source
                    .load()
                    .map_err(|e| PipelineError::new(0, Some(category), Stage::LoadHistory, e))
            })
            .collect()
    }

    /// Every category must be registered exactly once.
    fn check_registered(&self, horizon: usize) -> Result<(), PipelineError> {
        let mut seen = [false; 3];
        for input in &self.inputs {
            let category = input.source.category();
            if std::mem::replace(&mut seen[category.index()], true) {
                return Err(PipelineError::new(
                    horizon,
                    Some(category),
                    Stage::Align,
                    AlignError::DuplicateCategory(category),
                ));
            }
        }
        match Category::ALL.into_iter().find(|c| !seen[c.index()]) {
            Some(category) => Err(PipelineError::new(
                horizon,
                Some(category),
                Stage::Align,
                AlignError::MissingCategory(category),
            )),
            None => Ok(()),
        }
    }

    /// Forecast `horizon` months and return the consolidated table.
    pub fn generate_forecast(&self, horizon: usize) -> Result<ConsolidatedTable, PipelineError> {
        self.run(horizon).map(|run| run.table)
    }

    pub fn run(&self, horizon: usize) -> Result<ForecastRun, PipelineError> {
        self.run_with_cancel(horizon, &CancelToken::never())
    }

    /// Run the pipeline, checking `cancel` before each category and before the merge.
    ///
    /// A pipeline missing a category, or holding one twice, fails before any
    /// history is loaded.
    pub fn run_with_cancel(
        &self,
        horizon: usize,
        cancel: &CancelToken,
    ) -> Result<ForecastRun, PipelineError> {
        let started = Instant::now();
        if horizon == 0 {
            return Err(PipelineError::new(
                horizon,
                None,
                Stage::ResolveHorizon,
                HorizonError::InvalidHorizon(horizon),
            ));
        }
        self.check_registered(horizon)?;

        let mut categories = Vec::with_capacity(self.inputs.len());
        let mut forecasts = Vec::with_capacity(self.inputs.len());
        let mut hasher = blake3::Hasher::new();
        let mut has_synthetic = false;

        for input in &self.inputs {
            if cancel.is_cancelled() {
                return Err(PipelineError::superseded(horizon));
            }
            let category = input.source.category();
            let fail = |stage, kind: PipelineErrorKind| PipelineError {
                horizon,
                category: Some(category),
                stage,
                kind,
            };

            let series = input
                .source
                .load()
                .map_err(|e| fail(Stage::LoadHistory, e.into()))?;
            hash_series(&mut hasher, &series);
            has_synthetic |= input.source.is_synthetic();

            let window =
                resolve(&series, horizon).map_err(|e| fail(Stage::ResolveHorizon, e.into()))?;

            let forecast = forecast_with_timeout(&input.adapter, &window, self.model_timeout)
                .map_err(|e| fail(Stage::Forecast, e.into()))?;

            categories.push(CategoryRun {
                category,
                source: input.source.describe(),
                model: input.adapter.model_name().to_string(),
                interface: input.adapter.interface(),
                history_rows: series.len(),
                // resolve() succeeded, so the series is non-empty
                last_observed: series.last_date().unwrap_or(window.start()),
                window,
            });
            forecasts.push(forecast);
        }

        if cancel.is_cancelled() {
            return Err(PipelineError::superseded(horizon));
        }

        let table = merge(&forecasts, self.policy)
            .map_err(|e| PipelineError::new(horizon, None, Stage::Align, e))?;

        let elapsed = started.elapsed();
        tracing::info!(
            horizon,
            policy = ?self.policy,
            rows = table.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "forecast run complete"
        );

        Ok(ForecastRun {
            horizon,
            policy: self.policy,
            categories,
            forecasts,
            table,
            dataset_hash: hasher.finalize().to_hex().to_string(),
            has_synthetic,
            elapsed,
        })
    }
}

fn hash_series(hasher: &mut blake3::Hasher, series: &HistoricalSeries) {
    hasher.update(series.category().label().as_bytes());
    for point in series.points() {
        hasher.update(point.date.to_string().as_bytes());
        hasher.update(&point.sales.to_le_bytes());
    }
}

/// Call `adapter` on a helper thread and wait at most `timeout` for its answer.
///
/// A model that overruns is left to finish on its own thread; its late
/// result is dropped with the channel.
pub fn forecast_with_timeout(
    adapter: &Arc<dyn ForecastAdapter>,
    window: &ForecastWindow,
    timeout: Duration,
) -> Result<NormalizedForecast, AdapterError> {
    let category = window.category();
    let (tx, rx) = mpsc::channel();
    let job_adapter = Arc::clone(adapter);
    let job_window = window.clone();

    let spawned = thread::Builder::new()
        .name(format!("storecast-model-{}", category.label().to_ascii_lowercase()))
        .spawn(move || {
            let _ = tx.send(job_adapter.forecast(&job_window));
        });
    if let Err(e) = spawned {
        return Err(AdapterError::Unavailable {
            category,
            cause: ModelError::Aborted(format!("failed to spawn model thread: {e}")),
        });
    }

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(
                %category,
                model = adapter.model_name(),
                timeout_ms = timeout.as_millis() as u64,
                "model call timed out"
            );
            Err(AdapterError::Unavailable {
                category,
                cause: ModelError::Timeout(timeout),
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(AdapterError::Unavailable {
            category,
            cause: ModelError::Aborted("model thread exited without a result".into()),
        }),
    }
}
