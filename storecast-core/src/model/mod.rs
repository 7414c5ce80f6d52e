//! Forecasting model contracts.
//!
//! Pre-trained models are black boxes exposing one of two call shapes:
//! - [`DateListModel`]: predicts one value per explicitly requested date.
//! - [`DateRangeModel`]: predicts one value per month in an inclusive range.
//!
//! Both are blocking calls. Callers impose their own timeouts.

pub mod artifact;
pub mod linear_seasonal;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use artifact::{ArtifactError, ModelArtifact, ModelInterface};
pub use linear_seasonal::LinearSeasonalModel;

/// One predicted value as returned by a model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl ModelPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Failure reported by (or on behalf of) a model call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model call failed: {0}")]
    Failed(String),

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("model call aborted: {0}")]
    Aborted(String),
}

/// Model that predicts one value per requested date, in request order.
pub trait DateListModel: Send + Sync {
    /// Human-readable model name.
    fn name(&self) -> &str;

    /// Predict values for `dates`. Implementations should return exactly one
    /// point per input date, in the same order.
    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ModelPoint>, ModelError>;
}

/// Model that predicts one value per calendar month in `start..=end`.
pub trait DateRangeModel: Send + Sync {
    /// Human-readable model name.
    fn name(&self) -> &str;

    /// Predict monthly values over the inclusive range.
    fn predict(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ModelPoint>, ModelError>;
}
