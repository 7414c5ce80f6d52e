//! Domain types: categories and historical sales series.

pub mod category;
pub mod series;

pub use category::{Category, UnknownCategory};
pub use series::{HistoricalSeries, SalesPoint, SeriesError};
