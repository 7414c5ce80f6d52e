//! Derived views over a consolidated table.
//!
//! Pure functions: no I/O, no hidden state. Absent cells are skipped
//! everywhere; they never count as zero. Results are keyed by [`Category`]
//! in a `BTreeMap`, so iteration order is the fixed column order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::align::ConsolidatedTable;
use crate::domain::Category;

/// Highest and lowest month for one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    pub max_date: NaiveDate,
    pub max_value: f64,
    pub min_date: NaiveDate,
    pub min_value: f64,
}

/// Five-number summary plus mean over a category's present values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Everything the presentation layer shows for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: Category,
    pub total: f64,
    pub share: f64,
    pub months_present: usize,
    pub months_absent: usize,
    pub extrema: Option<Extrema>,
    pub distribution: Option<Distribution>,
}

/// Sum of present values per category. Every category is present in the
/// result; a fully absent column totals 0.
pub fn category_totals(table: &ConsolidatedTable) -> BTreeMap<Category, f64> {
    Category::ALL
        .iter()
        .map(|&c| (c, table.present(c).fold(0.0, |acc, (_, v)| acc + v)))
        .collect()
}

/// Fraction of the grand total per category.
///
/// When the totals sum to zero every share is 0 rather than an error, so a
/// dashboard can still render.
pub fn category_share(totals: &BTreeMap<Category, f64>) -> BTreeMap<Category, f64> {
    let sum: f64 = totals.values().sum();
    if sum == 0.0 {
        tracing::debug!("category totals sum to zero; shares set to zero");
        return totals.keys().map(|&c| (c, 0.0)).collect();
    }
    totals.iter().map(|(&c, &t)| (c, t / sum)).collect()
}

/// Highest and lowest present month for `category`.
///
/// Ties on value resolve to the earliest date. Returns `None` when the
/// category has no present values.
pub fn extrema(table: &ConsolidatedTable, category: Category) -> Option<Extrema> {
    let mut present = table.present(category);
    let (first_date, first_value) = present.next()?;
    let mut result = Extrema {
        max_date: first_date,
        max_value: first_value,
        min_date: first_date,
        min_value: first_value,
    };
    // Rows are chronological, so strict comparisons keep the earliest tie.
    for (date, value) in present {
        if value > result.max_value {
            result.max_date = date;
            result.max_value = value;
        }
        if value < result.min_value {
            result.min_date = date;
            result.min_value = value;
        }
    }
    Some(result)
}

/// Box-plot statistics for `category` using linear-interpolated quantiles.
pub fn distribution(table: &ConsolidatedTable, category: Category) -> Option<Distribution> {
    let mut values: Vec<f64> = table.present(category).map(|(_, v)| v).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    Some(Distribution {
        count,
        mean,
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values[count - 1],
    })
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Per-category summaries in column order, rebuilt from the table.
pub fn summarize(table: &ConsolidatedTable) -> Vec<CategorySummary> {
    let totals = category_totals(table);
    let shares = category_share(&totals);
    Category::ALL
        .iter()
        .map(|&category| {
            let months_absent = table.absent_count(category);
            CategorySummary {
                category,
                total: totals.get(&category).copied().unwrap_or(0.0),
                share: shares.get(&category).copied().unwrap_or(0.0),
                months_present: table.len() - months_absent,
                months_absent,
                extrema: extrema(table, category),
                distribution: distribution(table, category),
            }
        })
        .collect()
}
