//! Single-flight forecast session.
//!
//! At most one run is current per session. Starting a new run bumps a
//! generation counter; any older in-flight run sees its token cancelled,
//! stops at its next stage boundary, and reports [`Stage::Superseded`]
//! instead of a result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread;

use crate::pipeline::{ForecastPipeline, PipelineError, PipelineErrorKind, Stage};
use crate::report::DashboardReport;

/// Cancellation handle for one run.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    current: Option<Arc<AtomicU64>>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self {
            generation: 0,
            current: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.current {
            Some(current) => current.load(Ordering::SeqCst) != self.generation,
            None => false,
        }
    }
}

/// Owns a pipeline and serializes user-triggered predictions.
pub struct ForecastSession {
    pipeline: Arc<ForecastPipeline>,
    current: Arc<AtomicU64>,
}

impl ForecastSession {
    pub fn new(pipeline: ForecastPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn pipeline(&self) -> &ForecastPipeline {
        &self.pipeline
    }

    fn begin(&self) -> CancelToken {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        CancelToken {
            generation,
            current: Some(Arc::clone(&self.current)),
        }
    }

    /// Supersede whatever run is in flight without starting a new one.
    pub fn cancel(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    /// Start a run on a worker thread, superseding any run in flight.
    pub fn submit(&self, horizon: usize) -> PredictHandle {
        let token = self.begin();
        let (tx, rx) = mpsc::channel();
        let pipeline = Arc::clone(&self.pipeline);
        let job_token = token.clone();

        let spawned = thread::Builder::new()
            .name("storecast-session".into())
            .spawn(move || {
                let result = run_report(&pipeline, horizon, &job_token);
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            // The sender went down with the closure; wait() reports WorkerLost.
            tracing::warn!(error = %e, "failed to spawn session worker");
        }

        PredictHandle { token, rx, horizon }
    }

    /// Blocking form of [`submit`](Self::submit).
    pub fn predict(&self, horizon: usize) -> Result<DashboardReport, PipelineError> {
        let token = self.begin();
        let report = run_report(&self.pipeline, horizon, &token)?;
        if token.is_cancelled() {
            return Err(discard(horizon));
        }
        Ok(report)
    }
}

fn run_report(
    pipeline: &ForecastPipeline,
    horizon: usize,
    token: &CancelToken,
) -> Result<DashboardReport, PipelineError> {
    let run = pipeline.run_with_cancel(horizon, token)?;
    Ok(DashboardReport::from_run(&run))
}

fn discard(horizon: usize) -> PipelineError {
    tracing::warn!(horizon, "discarding superseded forecast");
    PipelineError::superseded(horizon)
}

/// Pending result of [`ForecastSession::submit`].
pub struct PredictHandle {
    token: CancelToken,
    rx: Receiver<Result<DashboardReport, PipelineError>>,
    horizon: usize,
}

impl PredictHandle {
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Whether a newer request has replaced this one.
    pub fn is_superseded(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Block until the run finishes. A result that arrives after the run was
    /// superseded is discarded.
    pub fn wait(self) -> Result<DashboardReport, PipelineError> {
        let result = self.rx.recv().map_err(|_| {
            PipelineError::new(self.horizon, None, Stage::Forecast, PipelineErrorKind::WorkerLost)
        })?;
        match result {
            Ok(_) if self.token.is_cancelled() => Err(discard(self.horizon)),
            other => other,
        }
    }
}
