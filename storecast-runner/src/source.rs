//! Where a category's historical series comes from.
//!
//! The pipeline calls [`HistorySource::load`] on every run; sources do not
//! cache, so edits to a CSV between runs are picked up.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use storecast_core::data::{CsvColumns, DataError, HistoryIngestor};
use storecast_core::{Category, HistoricalSeries};

use crate::synthetic::generate_synthetic_history;

/// A per-category historical dataset.
pub trait HistorySource: Send + Sync {
    fn category(&self) -> Category;

    /// Short description for logs and the data source view.
    fn describe(&self) -> String;

    /// Read the full history.
    fn load(&self) -> Result<HistoricalSeries, DataError>;

    /// Whether the data is generated rather than observed.
    fn is_synthetic(&self) -> bool {
        false
    }
}

/// History read from a CSV file.
pub struct CsvHistory {
    category: Category,
    path: PathBuf,
    ingestor: HistoryIngestor,
}

impl CsvHistory {
    pub fn new(category: Category, path: impl Into<PathBuf>, columns: CsvColumns) -> Self {
        Self {
            category,
            path: path.into(),
            ingestor: HistoryIngestor::new(columns),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistorySource for CsvHistory {
    fn category(&self) -> Category {
        self.category
    }

    fn describe(&self) -> String {
        format!("csv {}", self.path.display())
    }

    fn load(&self) -> Result<HistoricalSeries, DataError> {
        self.ingestor.ingest_csv(&self.path, self.category)
    }
}

/// History already held in memory.
#[derive(Debug, Clone)]
pub struct StaticHistory {
    series: HistoricalSeries,
}

impl StaticHistory {
    pub fn new(series: HistoricalSeries) -> Self {
        Self { series }
    }
}

impl HistorySource for StaticHistory {
    fn category(&self) -> Category {
        self.series.category()
    }

    fn describe(&self) -> String {
        format!("in-memory ({} rows)", self.series.len())
    }

    fn load(&self) -> Result<HistoricalSeries, DataError> {
        Ok(self.series.clone())
    }
}

/// Generated demo history, regenerated on every load.
#[derive(Debug, Clone)]
pub struct SyntheticHistory {
    category: Category,
    start: NaiveDate,
    months: usize,
}

impl SyntheticHistory {
    pub fn new(category: Category, start: NaiveDate, months: usize) -> Self {
        Self {
            category,
            start,
            months,
        }
    }
}

impl HistorySource for SyntheticHistory {
    fn category(&self) -> Category {
        self.category
    }

    fn describe(&self) -> String {
        format!("synthetic ({} months from {})", self.months, self.start)
    }

    fn load(&self) -> Result<HistoricalSeries, DataError> {
        Ok(generate_synthetic_history(
            self.category,
            self.start,
            self.months,
        ))
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_history_rereads_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("office.csv");
        std::fs::write(&path, "Order Date,Sales\n2023-11-03,10\n").unwrap();

        let source = CsvHistory::new(Category::Office, &path, CsvColumns::default());
        assert_eq!(source.load().unwrap().len(), 1);

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "2023-12-09,12").unwrap();
        drop(file);

        let series = source.load().unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2023, 12, 9));
    }

    #[test]
    fn missing_csv_is_an_error() {
        let source = CsvHistory::new(
            Category::Furniture,
            "/nonexistent/furniture.csv",
            CsvColumns::default(),
        );
        assert!(matches!(source.load(), Err(DataError::Open { .. })));
        assert!(!source.is_synthetic());
    }

    #[test]
    fn synthetic_history_is_flagged() {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let source = SyntheticHistory::new(Category::Technology, start, 6);
        assert!(source.is_synthetic());
        assert_eq!(source.load().unwrap().len(), 6);
    }
}
