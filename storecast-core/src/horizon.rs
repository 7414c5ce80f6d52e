//! Horizon resolution: from a historical tail to an explicit forecast window.
//!
//! The forecast starts on the first day of the month after the month of the
//! last observed date and runs for `horizon` consecutive months. Only the last
//! date of the history is consulted; gaps or irregular spacing earlier in the
//! series have no effect on the window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar;
use crate::domain::{Category, HistoricalSeries};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HorizonError {
    #[error("{category} history is empty; cannot determine a forecast start")]
    EmptySeries { category: Category },

    #[error("invalid horizon {0}: must be at least one month")]
    InvalidHorizon(usize),

    #[error("{category} forecast window overflows the calendar")]
    DateOverflow { category: Category },

    #[error("{category} forecast window is not a run of consecutive month starts")]
    MalformedWindow { category: Category },
}

/// Explicit monthly target dates for one category.
///
/// Invariant: non-empty, strictly increasing, consecutive calendar months,
/// every date is a month start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct ForecastWindow {
    category: Category,
    dates: Vec<NaiveDate>,
}

#[derive(Deserialize)]
struct RawWindow {
    category: Category,
    dates: Vec<NaiveDate>,
}

impl TryFrom<RawWindow> for ForecastWindow {
    type Error = HorizonError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        let category = raw.category;
        let first = *raw
            .dates
            .first()
            .ok_or(HorizonError::MalformedWindow { category })?;
        let rebuilt = Self::monthly(category, first, raw.dates.len())?;
        if rebuilt.dates != raw.dates {
            return Err(HorizonError::MalformedWindow { category });
        }
        Ok(rebuilt)
    }
}

impl ForecastWindow {
    /// Build a window of `horizon` month starts beginning at the month of `start`.
    pub fn monthly(
        category: Category,
        start: NaiveDate,
        horizon: usize,
    ) -> Result<Self, HorizonError> {
        if horizon == 0 {
            return Err(HorizonError::InvalidHorizon(horizon));
        }
        let first = calendar::month_start(start);
        let dates = (0..horizon)
            .map(|i| {
                u32::try_from(i)
                    .ok()
                    .and_then(|i| calendar::add_months(first, i))
                    .ok_or(HorizonError::DateOverflow { category })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { category, dates })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of months in the window.
    pub fn horizon(&self) -> usize {
        self.dates.len()
    }

    /// First target month.
    pub fn start(&self) -> NaiveDate {
        self.dates[0]
    }

    /// Last target month (inclusive).
    pub fn end(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }
}

/// Compute the forecast window for `series` over `horizon` months.
pub fn resolve(series: &HistoricalSeries, horizon: usize) -> Result<ForecastWindow, HorizonError> {
    let category = series.category();
    if horizon == 0 {
        return Err(HorizonError::InvalidHorizon(horizon));
    }
    let last = series
        .last_date()
        .ok_or(HorizonError::EmptySeries { category })?;
    let start = calendar::add_months(calendar::month_start(last), 1)
        .ok_or(HorizonError::DateOverflow { category })?;

    let window = ForecastWindow::monthly(category, start, horizon)?;
    tracing::debug!(
        %category,
        last_observed = %last,
        start = %window.start(),
        end = %window.end(),
        "resolved forecast window"
    );
    Ok(window)
}
