use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::domain::{Category, HistoricalSeries, SalesPoint, SeriesError};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Column names of a historical dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvColumns {
    pub date: String,
    pub sales: String,
}

impl Default for CsvColumns {
    fn default() -> Self {
        Self {
            date: "Order Date".into(),
            sales: "Sales".into(),
        }
    }
}

/// Reads per-category historical sales from CSV.
pub struct HistoryIngestor {
    columns: CsvColumns,
}

impl HistoryIngestor {
    pub fn new(columns: CsvColumns) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &CsvColumns {
        &self.columns
    }

    /// Ingest a CSV file into a sorted, date-deduplicated series.
    pub fn ingest_csv(&self, path: &Path, category: Category) -> Result<HistoricalSeries, DataError> {
        let file = std::fs::File::open(path).map_err(|source| DataError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let series = self.ingest_reader(file, category)?;
        tracing::debug!(
            %category,
            path = %path.display(),
            rows = series.len(),
            "ingested history"
        );
        Ok(series)
    }

    /// Ingest CSV from any reader. The first row must be a header.
    pub fn ingest_reader<R: Read>(
        &self,
        reader: R,
        category: Category,
    ) -> Result<HistoricalSeries, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| DataError::MissingColumn {
                    column: name.to_string(),
                })
        };
        let date_idx = find(&self.columns.date)?;
        let sales_idx = find(&self.columns.sales)?;

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let raw_date = record.get(date_idx).unwrap_or("");
            let raw_sales = record.get(sales_idx).unwrap_or("");

            let date = parse_date(raw_date).ok_or_else(|| DataError::BadDate {
                line,
                value: raw_date.to_string(),
            })?;
            let sales = raw_sales
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| DataError::BadSales {
                    line,
                    value: raw_sales.to_string(),
                })?;
            rows.push(SalesPoint::new(date, sales));
        }

        let raw_count = rows.len();
        let series = HistoricalSeries::from_rows(category, rows)?;
        if series.len() < raw_count {
            tracing::warn!(
                %category,
                merged = raw_count - series.len(),
                "summed rows sharing a date"
            );
        }
        Ok(series)
    }
}

impl Default for HistoryIngestor {
    fn default() -> Self {
        Self::new(CsvColumns::default())
    }
}

/// Parse a date in any of the accepted formats. Time of day is discarded.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: {column}")]
    MissingColumn { column: String },

    #[error("line {line}: unparseable date '{value}'")]
    BadDate { line: u64, value: String },

    #[error("line {line}: sales value '{value}' is not a finite number")]
    BadSales { line: u64, value: String },

    #[error("invalid series: {0}")]
    Series(#[from] SeriesError),

    #[error("history unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_accepted_date_formats() {
        assert_eq!(parse_date("2023-12-01"), Some(d(2023, 12, 1)));
        assert_eq!(parse_date("12/01/2023"), Some(d(2023, 12, 1)));
        assert_eq!(parse_date("2023-12-01 00:00:00"), Some(d(2023, 12, 1)));
        assert_eq!(parse_date("2023-12-01T08:30:00"), Some(d(2023, 12, 1)));
        assert_eq!(parse_date("December"), None);
    }

    #[test]
    fn ingests_unsorted_rows_with_extra_columns() {
        let csv = "Order Date,Category,Sales\n\
                   2023-02-01,Furniture,20.5\n\
                   2023-01-01,Furniture,10\n\
                   2023-02-01,Furniture,4.5\n";
        let series = HistoryIngestor::default()
            .ingest_reader(csv.as_bytes(), Category::Furniture)
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_date(), Some(d(2023, 2, 1)));
        assert_eq!(series.points()[1].sales, 25.0);
    }

    #[test]
    fn custom_column_names() {
        let csv = "ds,y\n2024-01-01,5\n";
        let ingestor = HistoryIngestor::new(CsvColumns {
            date: "ds".into(),
            sales: "y".into(),
        });
        let series = ingestor.ingest_reader(csv.as_bytes(), Category::Office).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn missing_column_is_reported() {
        let csv = "Date,Sales\n2024-01-01,5\n";
        let err = HistoryIngestor::default()
            .ingest_reader(csv.as_bytes(), Category::Office)
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column } if column == "Order Date"));
    }

    #[test]
    fn bad_sales_names_the_line() {
        let csv = "Order Date,Sales\n2024-01-01,5\n2024-02-01,n/a\n";
        let err = HistoryIngestor::default()
            .ingest_reader(csv.as_bytes(), Category::Technology)
            .unwrap_err();
        assert!(matches!(err, DataError::BadSales { line: 3, .. }));
    }

    #[test]
    fn bad_date_is_reported() {
        let csv = "Order Date,Sales\nsoon,5\n";
        let err = HistoryIngestor::default()
            .ingest_reader(csv.as_bytes(), Category::Technology)
            .unwrap_err();
        assert!(matches!(err, DataError::BadDate { .. }));
    }

    #[test]
    fn header_only_file_gives_empty_series() {
        let csv = "Order Date,Sales\n";
        let series = HistoryIngestor::default()
            .ingest_reader(csv.as_bytes(), Category::Furniture)
            .unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = HistoryIngestor::default()
            .ingest_csv(&dir.path().join("absent.csv"), Category::Furniture)
            .unwrap_err();
        assert!(matches!(err, DataError::Open { .. }));
    }
}
