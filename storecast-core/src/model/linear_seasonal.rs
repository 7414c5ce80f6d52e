//! Additive trend + monthly seasonality model.
//!
//! `value(date) = intercept + slope * months_since(origin) + seasonality[month]`
//!
//! Coefficients come from an offline training run and are loaded from a
//! model artifact. The same model can be served through either call shape.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{DateListModel, DateRangeModel, ModelError, ModelPoint};
use crate::calendar;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearSeasonalModel {
    name: String,
    origin: NaiveDate,
    intercept: f64,
    slope: f64,
    seasonality: [f64; 12],
    floor: Option<f64>,
}

impl LinearSeasonalModel {
    pub fn new(name: impl Into<String>, origin: NaiveDate, intercept: f64, slope: f64) -> Self {
        Self {
            name: name.into(),
            origin: calendar::month_start(origin),
            intercept,
            slope,
            seasonality: [0.0; 12],
            floor: None,
        }
    }

    /// Additive monthly offsets, January first.
    pub fn with_seasonality(mut self, seasonality: [f64; 12]) -> Self {
        self.seasonality = seasonality;
        self
    }

    /// Clamp predictions to at least `floor`.
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = Some(floor);
        self
    }

    pub fn origin(&self) -> NaiveDate {
        self.origin
    }

    /// Point prediction for the month containing `date`.
    pub fn value_at(&self, date: NaiveDate) -> f64 {
        let t = (calendar::month_index(date) - calendar::month_index(self.origin)) as f64;
        let raw = self.intercept + self.slope * t + self.seasonality[date.month0() as usize];
        match self.floor {
            Some(floor) => raw.max(floor),
            None => raw,
        }
    }
}

impl DateListModel for LinearSeasonalModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ModelPoint>, ModelError> {
        Ok(dates
            .iter()
            .map(|&date| ModelPoint::new(date, self.value_at(date)))
            .collect())
    }
}

impl DateRangeModel for LinearSeasonalModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ModelPoint>, ModelError> {
        let months = calendar::month_span(start, end);
        if months == 0 {
            return Err(ModelError::Failed(format!(
                "range end {end} precedes start {start}"
            )));
        }
        let first = calendar::month_start(start);
        (0..months)
            .map(|i| {
                u32::try_from(i)
                    .ok()
                    .and_then(|i| calendar::add_months(first, i))
                    .map(|date| ModelPoint::new(date, self.value_at(date)))
                    .ok_or_else(|| ModelError::Failed("date range overflows the calendar".into()))
            })
            .collect()
    }
}
