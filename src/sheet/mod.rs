//! Google Sheets report sink
//!
//! Each publish run creates a new worksheet named by the current UTC date
//! (`MM/DD/YY`), writes the header and flagged rows, then applies table
//! formatting: bold gray header, borders on the data range, alternating
//! row shading, fixed column widths.
//!
//! The spreadsheet itself sits behind the narrow [`Spreadsheet`] trait so
//! the publish logic can be tested against an in-memory fake. Two failure
//! modes are special-cased:
//! - a worksheet with today's name already exists: logged and skipped,
//!   nothing is overwritten;
//! - a formatting call fails after the data write: logged and ignored,
//!   the committed data stays in place.

mod google;

pub use google::GoogleSheetsClient;

use crate::error::Result;
use crate::report::{ReportOutcome, ReportRow, REPORT_HEADERS};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Placeholder written to A1 when the report is empty
pub const EMPTY_REPORT_MESSAGE: &str = "No underutilized instances found.";

/// Pixel widths per report column, in header order
pub const COLUMN_WIDTHS: [u32; 7] = [150, 200, 120, 120, 80, 100, 200];

/// Narrow capability over a remote spreadsheet.
///
/// Row and column indices are 1-based; `title` names a worksheet within the
/// target spreadsheet.
#[async_trait]
pub trait Spreadsheet: Send + Sync {
    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<()>;

    async fn resize(&self, title: &str, rows: u32, cols: u32) -> Result<()>;

    /// Write a rectangular block of values starting at A1
    async fn update_values(&self, title: &str, values: &[Vec<String>]) -> Result<()>;

    /// Bold, centered, gray-background header across `cols` columns
    async fn format_header(&self, title: &str, cols: u32) -> Result<()>;

    /// Solid borders over the full `rows` x `cols` data range
    async fn apply_borders(&self, title: &str, rows: u32, cols: u32) -> Result<()>;

    /// Light background shading across one row
    async fn shade_row(&self, title: &str, row: u32, cols: u32) -> Result<()>;

    async fn set_column_widths(&self, title: &str, widths: &[u32]) -> Result<()>;
}

/// Worksheet title for a run at `now`
pub fn sheet_title(now: DateTime<Utc>) -> String {
    now.format("%m/%d/%y").to_string()
}

/// Publish the report to a new dated worksheet.
///
/// Data is written before any formatting; a formatting failure leaves the
/// committed data in place. An existing worksheet for today's date skips
/// the run entirely.
pub async fn publish_report(
    sheet: &dyn Spreadsheet,
    rows: &[ReportRow],
    now: DateTime<Utc>,
) -> Result<ReportOutcome> {
    let title = sheet_title(now);

    info!("Creating new worksheet named: {}", title);
    match sheet.add_worksheet(&title, 1, 1).await {
        Ok(()) => {}
        Err(e) if e.is_sheet_exists() => {
            warn!("Sheet '{}' already exists. Skipping.", title);
            return Ok(ReportOutcome::SkippedExisting(title));
        }
        Err(e) => return Err(e),
    }

    if rows.is_empty() {
        sheet
            .update_values(&title, &[vec![EMPTY_REPORT_MESSAGE.to_string()]])
            .await?;
        info!("{}", EMPTY_REPORT_MESSAGE);
        return Ok(ReportOutcome::Empty);
    }

    let header: Vec<String> = REPORT_HEADERS.iter().map(|h| h.to_string()).collect();
    let mut full_data = vec![header];
    for row in rows {
        full_data.push(row.values().iter().map(|v| v.to_string()).collect());
    }

    let num_rows = full_data.len() as u32;
    let num_cols = REPORT_HEADERS.len() as u32;

    sheet.resize(&title, num_rows, num_cols).await?;
    sheet.update_values(&title, &full_data).await?;
    info!("Successfully wrote {} rows to sheet '{}'.", rows.len(), title);

    // Formatting is presentation only; the data write above already committed
    apply_formatting(sheet, &title, num_rows, num_cols).await;

    Ok(ReportOutcome::Written { rows: rows.len() })
}

async fn apply_formatting(sheet: &dyn Spreadsheet, title: &str, num_rows: u32, num_cols: u32) {
    if let Err(e) = sheet.format_header(title, num_cols).await {
        warn!("Failed to format header on '{}': {}", title, e);
    }
    if let Err(e) = sheet.apply_borders(title, num_rows, num_cols).await {
        warn!("Failed to apply borders on '{}': {}", title, e);
    }
    // Shade even-numbered rows, starting from the first data row
    for row in 2..=num_rows {
        if row % 2 == 0 {
            if let Err(e) = sheet.shade_row(title, row, num_cols).await {
                warn!("Failed to shade row {} on '{}': {}", row, title, e);
            }
        }
    }
    if let Err(e) = sheet.set_column_widths(title, &COLUMN_WIDTHS).await {
        warn!("Failed to set column widths on '{}': {}", title, e);
    }
}
