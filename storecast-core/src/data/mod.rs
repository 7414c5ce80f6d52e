//! Historical dataset ingestion.

pub mod ingest;

pub use ingest::{parse_date, CsvColumns, DataError, HistoryIngestor};
