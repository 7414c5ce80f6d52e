//! End-to-end scenarios over the core pieces: resolve → adapt → merge → aggregate.

use chrono::NaiveDate;
use storecast_core::{
    category_share, category_totals, extrema, merge, resolve, AlignmentPolicy, Category,
    DateListAdapter, DateListModel, DateRangeAdapter, DateRangeModel, ForecastAdapter,
    HistoricalSeries, ModelError, ModelPoint, SalesPoint,
};

fn month(y: i32, m: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, 1).unwrap()
}

fn history(category: Category, last: NaiveDate) -> HistoricalSeries {
    let rows = vec![
        SalesPoint::new(month(2023, 1), 50.0),
        SalesPoint::new(month(2023, 6), 60.0),
        SalesPoint::new(last, 70.0),
    ];
    HistoricalSeries::from_rows(category, rows).unwrap()
}

/// Date-list model answering a fixed value sequence.
struct Scripted {
    name: &'static str,
    values: Vec<f64>,
}

impl DateListModel for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn predict(&self, dates: &[NaiveDate]) -> Result<Vec<ModelPoint>, ModelError> {
        Ok(dates
            .iter()
            .zip(&self.values)
            .map(|(d, v)| ModelPoint::new(*d, *v))
            .collect())
    }
}

/// Date-range model answering a fixed value sequence from `start`.
struct ScriptedRange {
    values: Vec<f64>,
}

impl DateRangeModel for ScriptedRange {
    fn name(&self) -> &str {
        "scripted-range"
    }

    fn predict(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<ModelPoint>, ModelError> {
        let months = storecast_core::calendar::month_span(start, end);
        Ok((0..months)
            .zip(&self.values)
            .map(|(i, v)| {
                let date = storecast_core::calendar::add_months(start, i as u32).unwrap();
                ModelPoint::new(date, *v)
            })
            .collect())
    }
}

#[test]
fn december_tail_three_month_dashboard() {
    // GIVEN histories ending Dec-2023 for all three categories
    let tail = month(2023, 12);
    let furniture = history(Category::Furniture, tail);
    let office = history(Category::Office, tail);
    let technology = history(Category::Technology, tail);

    // WHEN windows are resolved for a 3-month horizon
    let wf = resolve(&furniture, 3).unwrap();
    let wo = resolve(&office, 3).unwrap();
    let wt = resolve(&technology, 3).unwrap();

    // THEN every window is Jan..Mar 2024
    let expected = [month(2024, 1), month(2024, 2), month(2024, 3)];
    assert_eq!(wf.dates(), &expected);
    assert_eq!(wo.dates(), &expected);
    assert_eq!(wt.dates(), &expected);

    // WHEN the three models forecast through their adapters
    let f = DateListAdapter::new(Scripted {
        name: "fb_furniture",
        values: vec![100.0, 110.0, 120.0],
    })
    .forecast(&wf)
    .unwrap();
    let o = DateRangeAdapter::new(ScriptedRange {
        values: vec![90.0, 95.0, 100.0],
    })
    .forecast(&wo)
    .unwrap();
    let t = DateListAdapter::new(Scripted {
        name: "fb_tech",
        values: vec![200.0, 210.0, 220.0],
    })
    .forecast(&wt)
    .unwrap();

    let table = merge(&[f, o, t], AlignmentPolicy::Union).unwrap();

    // THEN the consolidated table has three full rows
    assert_eq!(table.len(), 3);
    assert!(table.rows().all(|r| r.furniture.is_some()
        && r.office.is_some()
        && r.technology.is_some()));

    // AND totals, shares and extrema match
    let totals = category_totals(&table);
    assert_eq!(totals[&Category::Furniture], 330.0);
    assert_eq!(totals[&Category::Office], 285.0);
    assert_eq!(totals[&Category::Technology], 630.0);

    let shares = category_share(&totals);
    assert!((shares[&Category::Furniture] - 0.265).abs() < 1e-3);
    assert!((shares[&Category::Office] - 0.229).abs() < 1e-3);
    assert!((shares[&Category::Technology] - 0.506).abs() < 1e-3);

    let e = extrema(&table, Category::Furniture).unwrap();
    assert_eq!((e.max_date, e.max_value), (month(2024, 3), 120.0));
    assert_eq!((e.min_date, e.min_value), (month(2024, 1), 100.0));
}

#[test]
fn misaligned_tails_union_with_absences() {
    // GIVEN Furniture ending Nov-2023 and the others ending Dec-2023
    let furniture = history(Category::Furniture, month(2023, 11));
    let office = history(Category::Office, month(2023, 12));
    let technology = history(Category::Technology, month(2023, 12));

    let wf = resolve(&furniture, 2).unwrap();
    let wo = resolve(&office, 2).unwrap();
    let wt = resolve(&technology, 2).unwrap();
    assert_eq!(wf.dates(), &[month(2023, 12), month(2024, 1)]);
    assert_eq!(wo.dates(), &[month(2024, 1), month(2024, 2)]);
    assert_eq!(wt.dates(), &[month(2024, 1), month(2024, 2)]);

    let model = |values: Vec<f64>| Scripted { name: "m", values };
    let forecasts = vec![
        DateListAdapter::new(model(vec![1.0, 2.0])).forecast(&wf).unwrap(),
        DateListAdapter::new(model(vec![3.0, 4.0])).forecast(&wo).unwrap(),
        DateListAdapter::new(model(vec![5.0, 6.0])).forecast(&wt).unwrap(),
    ];

    // Union keeps all three months
    let table = merge(&forecasts, AlignmentPolicy::Union).unwrap();
    assert_eq!(table.dates(), &[month(2023, 12), month(2024, 1), month(2024, 2)]);

    let dec = table.row(0).unwrap();
    assert_eq!(dec.furniture, Some(1.0));
    assert_eq!(dec.office, None);
    assert_eq!(dec.technology, None);

    let feb = table.row(2).unwrap();
    assert_eq!(feb.furniture, None);
    assert_eq!(feb.office, Some(4.0));
    assert_eq!(feb.technology, Some(6.0));

    // Totals skip the absent cells
    let totals = category_totals(&table);
    assert_eq!(totals[&Category::Furniture], 3.0);
    assert_eq!(totals[&Category::Office], 7.0);

    // Intersection keeps only the shared month
    let strict = merge(&forecasts, AlignmentPolicy::Intersection).unwrap();
    assert_eq!(strict.dates(), &[month(2024, 1)]);
    assert_eq!(strict.cell(month(2024, 1), Category::Furniture), Some(2.0));
}
