//! Storecast Core: the forecast alignment and combination pipeline.
//!
//! This crate contains the pure pipeline pieces:
//! - Domain types (categories, historical sales series)
//! - Calendar-month arithmetic
//! - Horizon resolution (historical tail → explicit monthly forecast window)
//! - Model contracts and the adapters that normalize their output
//! - Alignment of per-category forecasts into one consolidated table
//! - Aggregations over the table (totals, shares, extrema, distributions)
//! - CSV ingestion of historical datasets

pub mod adapter;
pub mod aggregate;
pub mod align;
pub mod calendar;
pub mod data;
pub mod domain;
pub mod horizon;
pub mod model;

pub use adapter::{
    adapter_from_artifact, AdapterError, DateListAdapter, DateRangeAdapter, ForecastAdapter,
    NormalizedForecast,
};
pub use aggregate::{
    category_share, category_totals, distribution, extrema, summarize, CategorySummary,
    Distribution, Extrema,
};
pub use align::{merge, AlignError, AlignmentPolicy, ConsolidatedTable, TableRow};
pub use domain::{Category, HistoricalSeries, SalesPoint, SeriesError};
pub use horizon::{resolve, ForecastWindow, HorizonError};
pub use model::{DateListModel, DateRangeModel, ModelError, ModelPoint};
