//! CSV report sink
//!
//! Writes the flagged rows as a flat delimited table: one header row in
//! [`REPORT_HEADERS`] order, then one line per row. The file is overwritten
//! on each run. An empty report writes nothing and surfaces an explicit
//! empty outcome instead.

use crate::error::Result;
use crate::report::{ReportOutcome, ReportRow, REPORT_HEADERS};
use std::path::Path;
use tracing::info;

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the full report as CSV text
pub fn to_csv(rows: &[ReportRow]) -> String {
    let mut csv = REPORT_HEADERS.join(",");
    csv.push('\n');
    for row in rows {
        let line: Vec<String> = row.values().iter().map(|v| csv_field(v)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }
    csv
}

/// Write the report to `path`, overwriting any previous run's file
pub fn write_csv(rows: &[ReportRow], path: &Path) -> Result<ReportOutcome> {
    if rows.is_empty() {
        info!("No underutilized instances found. No report generated.");
        return Ok(ReportOutcome::Empty);
    }

    std::fs::write(path, to_csv(rows))?;
    info!("Generated report: {}", path.display());
    Ok(ReportOutcome::Written { rows: rows.len() })
}
