//! Reporting and export: JSON, CSV, and Markdown artifacts.
//!
//! - **JSON**: full round-trip of a [`DashboardReport`] with schema versioning
//! - **CSV**: consolidated forecast table and per-category summary
//! - **Markdown**: human-readable run report
//!
//! Absent cells are written as empty CSV fields and `-` in Markdown, never `0`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use storecast_core::{calendar, Category, CategorySummary, ConsolidatedTable};

use crate::report::{DashboardReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_json(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize DashboardReport to JSON")
}

/// Deserialize a report from JSON, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<DashboardReport> {
    let report: DashboardReport =
        serde_json::from_str(json).context("failed to deserialize DashboardReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

/// Export the consolidated table.
///
/// Columns: date, Furniture, Office Supplies, Technology
pub fn export_table_csv(table: &ConsolidatedTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["date".to_string()];
    header.extend(Category::ALL.iter().map(|c| c.display_name().to_string()));
    wtr.write_record(&header)?;

    for row in table.rows() {
        let mut record = vec![row.date.to_string()];
        record.extend(Category::ALL.iter().map(|c| cell(row.get(*c))));
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export per-category summaries.
///
/// Columns: category, total, share, months_present, months_absent, max_month,
/// max_value, min_month, min_value, mean, q1, median, q3
pub fn export_summary_csv(summaries: &[CategorySummary]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "category",
        "total",
        "share",
        "months_present",
        "months_absent",
        "max_month",
        "max_value",
        "min_month",
        "min_value",
        "mean",
        "q1",
        "median",
        "q3",
    ])?;

    for s in summaries {
        let e = s.extrema.as_ref();
        let d = s.distribution.as_ref();
        wtr.write_record([
            s.category.display_name().to_string(),
            format!("{:.2}", s.total),
            format!("{:.6}", s.share),
            s.months_present.to_string(),
            s.months_absent.to_string(),
            e.map(|e| e.max_date.to_string()).unwrap_or_default(),
            cell(e.map(|e| e.max_value)),
            e.map(|e| e.min_date.to_string()).unwrap_or_default(),
            cell(e.map(|e| e.min_value)),
            cell(d.map(|d| d.mean)),
            cell(d.map(|d| d.q1)),
            cell(d.map(|d| d.median)),
            cell(d.map(|d| d.q3)),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one prediction.
///
/// Creates a directory named `forecast_{horizon}m_{timestamp}/` under
/// `output_dir` containing:
/// - `report.json`: full report (schema-versioned)
/// - `forecast.csv`: consolidated table
/// - `summary.csv`: per-category totals, shares, extrema, quartiles
/// - `report.md`: human-readable report
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &DashboardReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "forecast_{}m_{}",
        report.horizon,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("report.json"), &json)?;

    let table_csv = export_table_csv(&report.table)?;
    std::fs::write(run_dir.join("forecast.csv"), &table_csv)?;

    let summary_csv = export_summary_csv(&report.summaries)?;
    std::fs::write(run_dir.join("summary.csv"), &summary_csv)?;

    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    tracing::info!(dir = %run_dir.display(), "saved forecast artifacts");
    Ok(run_dir)
}

/// Load a report from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<DashboardReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

fn md_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

/// Generate a Markdown report for one prediction.
pub fn generate_report(report: &DashboardReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Sales Forecast Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Horizon | {} months |\n", report.horizon));
    md.push_str(&format!("| Alignment | {:?} |\n", report.alignment));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if report.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    md.push_str("## Models\n\n");
    md.push_str("| Category | Model | Interface | History Rows | Last Observed | Window |\n");
    md.push_str("| --- | --- | --- | ---: | --- | --- |\n");
    for c in &report.categories {
        md.push_str(&format!(
            "| {} | {} | {:?} | {} | {} | {} .. {} |\n",
            c.category.display_name(),
            c.model,
            c.interface,
            c.history_rows,
            c.last_observed,
            calendar::month_label(c.window.start()),
            calendar::month_label(c.window.end()),
        ));
    }
    md.push('\n');

    md.push_str("## Forecast\n\n");
    md.push_str("| Month |");
    for c in Category::ALL {
        md.push_str(&format!(" {} |", c.display_name()));
    }
    md.push_str("\n| --- |");
    for _ in Category::ALL {
        md.push_str(" ---: |");
    }
    md.push('\n');
    for row in report.table.rows() {
        md.push_str(&format!("| {} |", calendar::month_label(row.date)));
        for c in Category::ALL {
            md.push_str(&format!(" {} |", md_cell(row.get(c))));
        }
        md.push('\n');
    }
    md.push('\n');

    md.push_str("## Summary\n\n");
    md.push_str("| Category | Total | Share | Highest Month | Lowest Month |\n");
    md.push_str("| --- | ---: | ---: | --- | --- |\n");
    for s in &report.summaries {
        let (high, low) = match &s.extrema {
            Some(e) => (
                format!("{} ({:.2})", calendar::month_label(e.max_date), e.max_value),
                format!("{} ({:.2})", calendar::month_label(e.min_date), e.min_value),
            ),
            None => ("-".into(), "-".into()),
        };
        md.push_str(&format!(
            "| {} | {:.2} | {:.1}% | {} | {} |\n",
            s.category.display_name(),
            s.total,
            s.share * 100.0,
            high,
            low
        ));
    }

    md
}
