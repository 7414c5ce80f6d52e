//! Dashboard report: a finished run plus every derived view.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use storecast_core::{
    category_share, category_totals, summarize, AlignmentPolicy, Category, CategorySummary,
    ConsolidatedTable,
};

use crate::pipeline::{CategoryRun, ForecastRun};

/// Current report schema version. Bump on breaking changes.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything the presentation layer reads after a prediction.
///
/// Built once from a [`ForecastRun`] and never mutated; a new prediction
/// builds a new report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub horizon: usize,
    pub alignment: AlignmentPolicy,
    pub categories: Vec<CategoryRun>,
    pub table: ConsolidatedTable,
    pub totals: BTreeMap<Category, f64>,
    pub shares: BTreeMap<Category, f64>,
    pub summaries: Vec<CategorySummary>,
    pub dataset_hash: String,
    #[serde(default)]
    pub has_synthetic: bool,
}

impl DashboardReport {
    pub fn from_run(run: &ForecastRun) -> Self {
        let totals = category_totals(&run.table);
        let shares = category_share(&totals);
        Self {
            schema_version: SCHEMA_VERSION,
            horizon: run.horizon,
            alignment: run.policy,
            categories: run.categories.clone(),
            table: run.table.clone(),
            totals,
            shares,
            summaries: summarize(&run.table),
            dataset_hash: run.dataset_hash.clone(),
            has_synthetic: run.has_synthetic,
        }
    }

    pub fn summary(&self, category: Category) -> Option<&CategorySummary> {
        self.summaries.iter().find(|s| s.category == category)
    }

    /// Sum of all category totals.
    pub fn grand_total(&self) -> f64 {
        self.totals.values().fold(0.0, |acc, v| acc + v)
    }
}
