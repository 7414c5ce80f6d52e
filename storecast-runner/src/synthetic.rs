//! Synthetic demo data: monthly histories and built-in model coefficients.
//!
//! Lets the pipeline run with no files on disk. Histories are deterministic
//! (seeded from the category name) and runs built on them are tagged as
//! synthetic in the report.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use storecast_core::calendar;
use storecast_core::model::{ModelArtifact, ModelInterface};
use storecast_core::{Category, HistoricalSeries, SalesPoint};

/// First month of every synthetic history.
pub fn demo_origin() -> NaiveDate {
    NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Number of months in a default synthetic history (Jan-2014..Dec-2017).
pub const DEMO_MONTHS: usize = 48;

/// Built-in model coefficients for `category`.
///
/// Office Supplies is served through the date-range shape, the others
/// through the date-list shape.
pub fn demo_artifact(category: Category) -> ModelArtifact {
    let (name, interface, intercept, slope, seasonality) = match category {
        Category::Furniture => (
            "furniture_demo",
            ModelInterface::DateList,
            620.0,
            4.5,
            [
                -210.0, -320.0, 10.0, -110.0, -90.0, -60.0, -40.0, -130.0, 310.0, -30.0, 330.0,
                390.0,
            ],
        ),
        Category::Office => (
            "office_demo",
            ModelInterface::DateRange,
            540.0,
            5.0,
            [
                -190.0, -280.0, 30.0, -70.0, -70.0, -40.0, -30.0, -50.0, 300.0, -40.0, 290.0,
                320.0,
            ],
        ),
        Category::Technology => (
            "technology_demo",
            ModelInterface::DateList,
            710.0,
            6.5,
            [
                -230.0, -330.0, 90.0, -120.0, -60.0, -40.0, -20.0, -70.0, 370.0, 40.0, 350.0,
                410.0,
            ],
        ),
    };
    ModelArtifact {
        name: name.to_string(),
        interface,
        origin: demo_origin(),
        intercept,
        slope,
        seasonality: Some(seasonality.to_vec()),
        floor: Some(0.0),
    }
}

/// Deterministic monthly history for `category`: the demo model's curve with
/// up to ±15% multiplicative noise.
pub fn generate_synthetic_history(
    category: Category,
    start: NaiveDate,
    months: usize,
) -> HistoricalSeries {
    let seed_bytes = blake3::hash(format!("storecast-synthetic-{}", category.label()).as_bytes());
    let mut rng = StdRng::from_seed(*seed_bytes.as_bytes());

    // demo_artifact() is always valid; an invalid one would yield no curve at all.
    let model = demo_artifact(category).to_model().ok();
    let start = calendar::month_start(start);

    let points = (0..months)
        .map_while(|i| calendar::add_months(start, u32::try_from(i).ok()?))
        .map(|date| {
            let base = model.as_ref().map_or(0.0, |m| m.value_at(date));
            let noise: f64 = rng.gen_range(-0.15..0.15);
            let sales = (base * (1.0 + noise)).max(0.0);
            SalesPoint::new(date, (sales * 100.0).round() / 100.0)
        })
        .collect();

    // Dates are consecutive month starts and values finite; fall back to an
    // empty series rather than panic if that ever stops holding.
    HistoricalSeries::new(category, points).unwrap_or_else(|e| {
        tracing::warn!(%category, error = %e, "synthetic history rejected");
        HistoricalSeries::empty(category)
    })
}
