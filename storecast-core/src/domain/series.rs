//! Historical sales series for a single category.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Category;

/// One observed (date, sales) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub date: NaiveDate,
    pub sales: f64,
}

impl SalesPoint {
    pub fn new(date: NaiveDate, sales: f64) -> Self {
        Self { date, sales }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("{category} history is not strictly increasing at row {index} ({date})")]
    Unordered {
        category: Category,
        index: usize,
        date: NaiveDate,
    },

    #[error("{category} history has a non-finite sales value on {date}")]
    NonFinite { category: Category, date: NaiveDate },
}

/// Date-ordered, date-deduplicated sales history for one category.
///
/// Invariant: dates are strictly increasing and every sales value is finite.
/// The series may be empty; the horizon resolver rejects empty series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    category: Category,
    points: Vec<SalesPoint>,
}

impl HistoricalSeries {
    /// Build a series from points that are already sorted and unique.
    pub fn new(category: Category, points: Vec<SalesPoint>) -> Result<Self, SeriesError> {
        for (i, p) in points.iter().enumerate() {
            if !p.sales.is_finite() {
                return Err(SeriesError::NonFinite {
                    category,
                    date: p.date,
                });
            }
            if i > 0 && points[i - 1].date >= p.date {
                return Err(SeriesError::Unordered {
                    category,
                    index: i,
                    date: p.date,
                });
            }
        }
        Ok(Self { category, points })
    }

    /// Build a series from raw rows: sort by date and sum rows sharing a date.
    pub fn from_rows(category: Category, mut rows: Vec<SalesPoint>) -> Result<Self, SeriesError> {
        rows.sort_by_key(|p| p.date);
        let mut points: Vec<SalesPoint> = Vec::with_capacity(rows.len());
        for row in rows {
            match points.last_mut() {
                Some(last) if last.date == row.date => last.sales += row.sales,
                _ => points.push(row),
            }
        }
        Self::new(category, points)
    }

    pub fn empty(category: Category) -> Self {
        Self {
            category,
            points: Vec::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn points(&self) -> &[SalesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Last observed date. Only this date matters for forecast windows.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// The last `n` points (or all of them if shorter).
    pub fn tail(&self, n: usize) -> &[SalesPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }
}
