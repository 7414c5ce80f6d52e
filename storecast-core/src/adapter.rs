//! Forecast adapters: one normalized capability over heterogeneous models.
//!
//! Every adapter turns a [`ForecastWindow`] into a [`NormalizedForecast`]
//! (date → value, one entry per window month). The aligner never learns which
//! call shape produced a series.
//!
//! Model output is validated strictly: a count or date mismatch is an error,
//! never truncated or padded, and no partial forecast escapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::Category;
use crate::horizon::ForecastWindow;
use crate::model::{
    ArtifactError, DateListModel, DateRangeModel, ModelArtifact, ModelError, ModelInterface,
    ModelPoint,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdapterError {
    #[error(
        "forecast shape mismatch for {category} ({model}): requested {expected} months, model returned {actual}"
    )]
    ShapeMismatch {
        category: Category,
        model: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "forecast shape mismatch for {category} ({model}): row {index} is dated {actual}, expected {expected}"
    )]
    MisalignedDates {
        category: Category,
        model: String,
        index: usize,
        expected: NaiveDate,
        actual: NaiveDate,
    },

    #[error("forecast for {category} ({model}) has a non-finite value on {date}")]
    NonFiniteValue {
        category: Category,
        model: String,
        date: NaiveDate,
    },

    #[error("forecast unavailable for {category}: {cause}")]
    Unavailable { category: Category, cause: ModelError },
}

impl AdapterError {
    pub fn category(&self) -> Category {
        match self {
            AdapterError::ShapeMismatch { category, .. }
            | AdapterError::MisalignedDates { category, .. }
            | AdapterError::NonFiniteValue { category, .. }
            | AdapterError::Unavailable { category, .. } => *category,
        }
    }

    /// True for any variant where the model answered with the wrong shape.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self,
            AdapterError::ShapeMismatch { .. } | AdapterError::MisalignedDates { .. }
        )
    }
}

/// Per-category predicted sales keyed by month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedForecast {
    category: Category,
    values: BTreeMap<NaiveDate, f64>,
}

impl NormalizedForecast {
    pub fn new(category: Category, values: BTreeMap<NaiveDate, f64>) -> Self {
        Self { category, values }
    }

    pub fn from_pairs(
        category: Category,
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self::new(category, pairs.into_iter().collect())
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.values.get(&date).copied()
    }

    /// Entries in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values.iter().map(|(d, v)| (*d, *v))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Uniform forecasting capability over a pre-trained model.
pub trait ForecastAdapter: Send + Sync {
    /// Name of the wrapped model.
    fn model_name(&self) -> &str;

    /// Call shape of the wrapped model.
    fn interface(&self) -> ModelInterface;

    /// Forecast every month of `window` for the window's category.
    fn forecast(&self, window: &ForecastWindow) -> Result<NormalizedForecast, AdapterError>;
}

/// Adapter for models that take an explicit list of dates.
#[derive(Debug, Clone)]
pub struct DateListAdapter<M> {
    model: M,
}

impl<M: DateListModel> DateListAdapter<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: DateListModel> ForecastAdapter for DateListAdapter<M> {
    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn interface(&self) -> ModelInterface {
        ModelInterface::DateList
    }

    fn forecast(&self, window: &ForecastWindow) -> Result<NormalizedForecast, AdapterError> {
        let points = self
            .model
            .predict(window.dates())
            .map_err(|cause| AdapterError::Unavailable {
                category: window.category(),
                cause,
            })?;
        normalize(window, self.model.name(), points)
    }
}

/// Adapter for models that take an inclusive start/end month range.
#[derive(Debug, Clone)]
pub struct DateRangeAdapter<M> {
    model: M,
}

impl<M: DateRangeModel> DateRangeAdapter<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

impl<M: DateRangeModel> ForecastAdapter for DateRangeAdapter<M> {
    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn interface(&self) -> ModelInterface {
        ModelInterface::DateRange
    }

    fn forecast(&self, window: &ForecastWindow) -> Result<NormalizedForecast, AdapterError> {
        // end = start + (horizon - 1) months, i.e. the window's last month
        let points = self
            .model
            .predict(window.start(), window.end())
            .map_err(|cause| AdapterError::Unavailable {
                category: window.category(),
                cause,
            })?;
        normalize(window, self.model.name(), points)
    }
}

/// Validate model output against the requested window and key it by date.
fn normalize(
    window: &ForecastWindow,
    model: &str,
    points: Vec<ModelPoint>,
) -> Result<NormalizedForecast, AdapterError> {
    let category = window.category();
    if points.len() != window.horizon() {
        return Err(AdapterError::ShapeMismatch {
            category,
            model: model.to_string(),
            expected: window.horizon(),
            actual: points.len(),
        });
    }

    let mut values = BTreeMap::new();
    for (index, (expected, point)) in window.dates().iter().zip(&points).enumerate() {
        if point.date != *expected {
            return Err(AdapterError::MisalignedDates {
                category,
                model: model.to_string(),
                index,
                expected: *expected,
                actual: point.date,
            });
        }
        if !point.value.is_finite() {
            return Err(AdapterError::NonFiniteValue {
                category,
                model: model.to_string(),
                date: point.date,
            });
        }
        values.insert(*expected, point.value);
    }

    tracing::debug!(%category, model, months = values.len(), "normalized forecast");
    Ok(NormalizedForecast::new(category, values))
}

/// Build the adapter matching an artifact's declared interface.
pub fn adapter_from_artifact(
    artifact: &ModelArtifact,
) -> Result<Arc<dyn ForecastAdapter>, ArtifactError> {
    let model = artifact.to_model()?;
    let adapter: Arc<dyn ForecastAdapter> = match artifact.interface {
        ModelInterface::DateList => Arc::new(DateListAdapter::new(model)),
        ModelInterface::DateRange => Arc::new(DateRangeAdapter::new(model)),
    };
    Ok(adapter)
}
