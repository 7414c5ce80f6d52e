//! Multi-category time alignment.
//!
//! Given normalized forecasts for several categories, align them to a common
//! monthly timeline. A category with no value for a date gets an absent cell
//! (`None`), never a zero.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::adapter::NormalizedForecast;
use crate::domain::Category;

/// How to choose the table's date index when forecast windows differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Every date present in any forecast; missing cells are absent.
    #[default]
    Union,
    /// Only dates present in every supplied forecast.
    Intersection,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("more than one forecast supplied for {0}")]
    DuplicateCategory(Category),

    #[error("no forecast supplied for {0}")]
    MissingCategory(Category),

    #[error("table has more than one row for {0}")]
    DuplicateDate(NaiveDate),
}

/// One row of the consolidated table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub date: NaiveDate,
    pub furniture: Option<f64>,
    pub office: Option<f64>,
    pub technology: Option<f64>,
}

impl TableRow {
    pub fn get(&self, category: Category) -> Option<f64> {
        match category {
            Category::Furniture => self.furniture,
            Category::Office => self.office,
            Category::Technology => self.technology,
        }
    }
}

/// Date-indexed sales projections with one column per category.
///
/// Invariants: `dates` is strictly increasing; every column has the same
/// length as `dates`; columns follow [`Category::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<TableRow>", try_from = "Vec<TableRow>")]
pub struct ConsolidatedTable {
    dates: Vec<NaiveDate>,
    columns: [Vec<Option<f64>>; 3],
}

impl ConsolidatedTable {
    pub fn empty() -> Self {
        Self {
            dates: Vec::new(),
            columns: [Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// The common date axis (sorted ascending).
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Cells for one category, aligned with `dates()`.
    pub fn column(&self, category: Category) -> &[Option<f64>] {
        &self.columns[category.index()]
    }

    pub fn cell(&self, date: NaiveDate, category: Category) -> Option<f64> {
        let row = self.dates.binary_search(&date).ok()?;
        self.columns[category.index()][row]
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<TableRow> {
        let date = *self.dates.get(index)?;
        Some(TableRow {
            date,
            furniture: self.columns[0][index],
            office: self.columns[1][index],
            technology: self.columns[2][index],
        })
    }

    /// Rows in chronological order.
    pub fn rows(&self) -> impl Iterator<Item = TableRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    /// Present (date, value) cells for one category, chronologically.
    pub fn present(&self, category: Category) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates
            .iter()
            .zip(self.column(category))
            .filter_map(|(d, v)| v.map(|v| (*d, v)))
    }

    /// Number of absent cells in a category's column.
    pub fn absent_count(&self, category: Category) -> usize {
        self.column(category).iter().filter(|v| v.is_none()).count()
    }
}

impl From<ConsolidatedTable> for Vec<TableRow> {
    fn from(table: ConsolidatedTable) -> Self {
        table.rows().collect()
    }
}

impl TryFrom<Vec<TableRow>> for ConsolidatedTable {
    type Error = AlignError;

    fn try_from(mut rows: Vec<TableRow>) -> Result<Self, Self::Error> {
        rows.sort_by_key(|r| r.date);
        if let Some(pair) = rows.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(AlignError::DuplicateDate(pair[0].date));
        }
        let mut table = ConsolidatedTable::empty();
        for row in rows {
            table.dates.push(row.date);
            for category in Category::ALL {
                table.columns[category.index()].push(row.get(category));
            }
        }
        Ok(table)
    }
}

/// Merge per-category forecasts into one date-indexed table.
///
/// Categories not supplied at all get a fully absent column.
pub fn merge(
    forecasts: &[NormalizedForecast],
    policy: AlignmentPolicy,
) -> Result<ConsolidatedTable, AlignError> {
    let mut slots: [Option<&NormalizedForecast>; 3] = [None, None, None];
    for forecast in forecasts {
        let slot = &mut slots[forecast.category().index()];
        if slot.is_some() {
            return Err(AlignError::DuplicateCategory(forecast.category()));
        }
        *slot = Some(forecast);
    }

    // Collect the union of all dates
    let union: BTreeSet<NaiveDate> = forecasts.iter().flat_map(|f| f.dates()).collect();
    let dates: Vec<NaiveDate> = match policy {
        AlignmentPolicy::Union => union.into_iter().collect(),
        AlignmentPolicy::Intersection => union
            .into_iter()
            .filter(|d| forecasts.iter().all(|f| f.get(*d).is_some()))
            .collect(),
    };

    let columns = Category::ALL.map(|category| match slots[category.index()] {
        Some(forecast) => dates.iter().map(|d| forecast.get(*d)).collect(),
        None => vec![None; dates.len()],
    });

    let table = ConsolidatedTable { dates, columns };
    for category in Category::ALL {
        let absent = table.absent_count(category);
        if absent > 0 {
            tracing::debug!(%category, absent, "absent cells after alignment");
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn forecast(category: Category, pairs: &[(NaiveDate, f64)]) -> NormalizedForecast {
        NormalizedForecast::from_pairs(category, pairs.iter().copied())
    }

    #[test]
    fn same_windows_align_without_absences() {
        let f = forecast(Category::Furniture, &[(d(2024, 1), 100.0), (d(2024, 2), 110.0)]);
        let o = forecast(Category::Office, &[(d(2024, 1), 90.0), (d(2024, 2), 95.0)]);
        let t = forecast(Category::Technology, &[(d(2024, 1), 200.0), (d(2024, 2), 210.0)]);

        let table = merge(&[f, o, t], AlignmentPolicy::Union).unwrap();

        assert_eq!(table.len(), 2);
        for c in Category::ALL {
            assert_eq!(table.absent_count(c), 0);
        }
        assert_eq!(table.cell(d(2024, 2), Category::Office), Some(95.0));
    }

    #[test]
    fn union_marks_missing_cells_absent() {
        let f = forecast(Category::Furniture, &[(d(2023, 12), 1.0), (d(2024, 1), 2.0)]);
        let o = forecast(Category::Office, &[(d(2024, 1), 3.0), (d(2024, 2), 4.0)]);

        let table = merge(&[o, f], AlignmentPolicy::Union).unwrap();

        assert_eq!(table.dates(), &[d(2023, 12), d(2024, 1), d(2024, 2)]);
        assert_eq!(table.column(Category::Furniture), &[Some(1.0), Some(2.0), None]);
        assert_eq!(table.column(Category::Office), &[None, Some(3.0), Some(4.0)]);
        // Technology was never supplied.
        assert_eq!(table.absent_count(Category::Technology), 3);
    }

    #[test]
    fn intersection_keeps_only_shared_dates() {
        let f = forecast(Category::Furniture, &[(d(2023, 12), 1.0), (d(2024, 1), 2.0)]);
        let o = forecast(Category::Office, &[(d(2024, 1), 3.0), (d(2024, 2), 4.0)]);

        let table = merge(&[f, o], AlignmentPolicy::Intersection).unwrap();

        assert_eq!(table.dates(), &[d(2024, 1)]);
        assert_eq!(table.cell(d(2024, 1), Category::Furniture), Some(2.0));
        assert_eq!(table.cell(d(2024, 1), Category::Office), Some(3.0));
    }

    #[test]
    fn duplicate_category_is_rejected() {
        let a = forecast(Category::Office, &[(d(2024, 1), 1.0)]);
        let b = forecast(Category::Office, &[(d(2024, 2), 2.0)]);
        assert_eq!(
            merge(&[a, b], AlignmentPolicy::Union),
            Err(AlignError::DuplicateCategory(Category::Office))
        );
    }

    #[test]
    fn zero_is_not_absent() {
        let f = forecast(Category::Furniture, &[(d(2024, 1), 0.0)]);
        let table = merge(&[f], AlignmentPolicy::Union).unwrap();
        assert_eq!(table.cell(d(2024, 1), Category::Furniture), Some(0.0));
        assert_eq!(table.cell(d(2024, 1), Category::Office), None);
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = merge(&[], AlignmentPolicy::Union).unwrap();
        assert!(table.is_empty());
        assert_eq!(table, ConsolidatedTable::empty());
    }

    #[test]
    fn serializes_as_rows_with_null_absences() {
        let f = forecast(Category::Furniture, &[(d(2024, 1), 5.0)]);
        let table = merge(&[f], AlignmentPolicy::Union).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[0]["date"], "2024-01-01");
        assert_eq!(json[0]["furniture"], 5.0);
        assert!(json[0]["office"].is_null());

        let back: ConsolidatedTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn rows_with_repeated_dates_are_rejected() {
        let row = TableRow {
            date: d(2024, 1),
            furniture: Some(1.0),
            office: None,
            technology: None,
        };
        let second = TableRow {
            furniture: Some(2.0),
            ..row
        };
        assert_eq!(
            ConsolidatedTable::try_from(vec![row, second]),
            Err(AlignError::DuplicateDate(d(2024, 1)))
        );

        let json = serde_json::to_value(vec![row, second]).unwrap();
        let err = serde_json::from_value::<ConsolidatedTable>(json).unwrap_err();
        assert!(err.to_string().contains("more than one row"), "{err}");
    }

    #[test]
    fn rows_are_sorted_on_the_way_in() {
        let jan = TableRow {
            date: d(2024, 1),
            furniture: Some(1.0),
            office: None,
            technology: None,
        };
        let feb = TableRow {
            date: d(2024, 2),
            ..jan
        };
        let table = ConsolidatedTable::try_from(vec![feb, jan]).unwrap();
        assert_eq!(table.dates(), &[d(2024, 1), d(2024, 2)]);
    }
}
