//! Report assembly
//!
//! Drives the per-instance pipeline: for each enumerated instance, apply
//! the exclusion filter, fetch the metric window, classify, and collect a
//! row for every flagged instance. Metrics are fetched one instance at a
//! time; the run is fully sequential, so total time scales linearly with
//! instance count and only one API call is outstanding at once.

use crate::classifier::{self, Classification};
use crate::config::AnalysisConfig;
use crate::inventory::InstanceRecord;
use crate::metrics::MetricsSource;
use comfy_table::{Cell, Table};
use console::style;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of a sink write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Rows were written
    Written { rows: usize },
    /// Nothing to report; no table was produced
    Empty,
    /// A worksheet with today's name already exists; write skipped
    SkippedExisting(String),
}

/// Report column names, in output order
pub const REPORT_HEADERS: [&str; 7] = [
    "InstanceId",
    "Name",
    "Region",
    "InstanceType",
    "AvgCPU",
    "AvgCPUCredits",
    "Recommendation",
];

/// One flagged instance, all fields pre-formatted for the sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub instance_id: String,
    pub name: String,
    pub region: String,
    pub instance_type: String,
    pub avg_cpu: String,
    pub avg_credits: String,
    pub recommendation: String,
}

impl ReportRow {
    /// Field values in [`REPORT_HEADERS`] order
    pub fn values(&self) -> [&str; 7] {
        [
            &self.instance_id,
            &self.name,
            &self.region,
            &self.instance_type,
            &self.avg_cpu,
            &self.avg_credits,
            &self.recommendation,
        ]
    }
}

pub fn format_cpu(cpu_avg: f64) -> String {
    format!("{:.2}%", cpu_avg)
}

pub fn format_credits(credit_avg: Option<f64>) -> String {
    match credit_avg {
        Some(avg) => format!("{:.0}", avg),
        None => "N/A".to_string(),
    }
}

fn recommendation_text(classification: &Classification) -> Option<String> {
    match classification {
        Classification::LowCredits => {
            Some("Needs Review (Low CPU Credit Balance)".to_string())
        }
        Classification::Underutilized(rec) => Some(rec.to_string()),
        Classification::Excluded | Classification::NotFlagged => None,
    }
}

/// Build the report over a collected inventory.
///
/// A row is produced if-and-only-if the instance triggered the low-credit
/// guard or the utilization rule. Excluded instances never reach the
/// metrics fetcher.
pub async fn build_report(
    inventory: &[(String, Vec<InstanceRecord>)],
    metrics: &dyn MetricsSource,
    analysis: &AnalysisConfig,
) -> Vec<ReportRow> {
    let mut rows = Vec::new();

    for (region, instances) in inventory {
        for instance in instances {
            let parsed = classifier::parse_instance_type(&instance.instance_type);
            let excluded = match parsed {
                None => true,
                Some((_, size)) => analysis.ignore_sizes.iter().any(|s| s == size),
            };
            if excluded {
                debug!(
                    "Excluding {} ({}) before metrics fetch",
                    instance.id, instance.instance_type
                );
                continue;
            }

            let sample = metrics.fetch(&instance.id, region).await;
            let classification = classifier::classify(&instance.instance_type, &sample, analysis);

            if let Some(recommendation) = recommendation_text(&classification) {
                rows.push(ReportRow {
                    instance_id: instance.id.clone(),
                    name: instance.name.clone(),
                    region: region.clone(),
                    instance_type: instance.instance_type.clone(),
                    avg_cpu: format_cpu(sample.cpu_avg),
                    avg_credits: format_credits(sample.credit_avg),
                    recommendation,
                });
            }
        }
    }

    rows
}

/// Render the report as a terminal table with a short summary line
pub fn print_report(rows: &[ReportRow]) {
    if rows.is_empty() {
        println!(
            "{}",
            style("No underutilized instances found based on the defined criteria.").green()
        );
        return;
    }

    let mut table = Table::new();
    table.set_header(REPORT_HEADERS.to_vec());
    for row in rows {
        let recommendation_cell = if row.recommendation.starts_with("Review")
            || row.recommendation.starts_with("Needs Review")
        {
            Cell::new(&row.recommendation).fg(comfy_table::Color::Yellow)
        } else {
            Cell::new(&row.recommendation).fg(comfy_table::Color::Green)
        };
        table.add_row(vec![
            Cell::new(&row.instance_id),
            Cell::new(&row.name),
            Cell::new(&row.region),
            Cell::new(&row.instance_type),
            Cell::new(&row.avg_cpu),
            Cell::new(&row.avg_credits),
            recommendation_cell,
        ]);
    }
    println!("{}", table);
    println!(
        "  {} {} instance(s) flagged",
        style("Total:").bold(),
        style(rows.len()).yellow()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cpu() {
        assert_eq!(format_cpu(12.3), "12.30%");
        assert_eq!(format_cpu(0.0), "0.00%");
        assert_eq!(format_cpu(99.999), "100.00%");
    }

    #[test]
    fn test_format_credits() {
        assert_eq!(format_credits(Some(40.4)), "40");
        assert_eq!(format_credits(Some(40.6)), "41");
        assert_eq!(format_credits(None), "N/A");
    }

    #[test]
    fn test_values_match_header_order() {
        let row = ReportRow {
            instance_id: "i-1".to_string(),
            name: "web".to_string(),
            region: "us-east-1".to_string(),
            instance_type: "m5.large".to_string(),
            avg_cpu: "5.00%".to_string(),
            avg_credits: "N/A".to_string(),
            recommendation: "m5.medium".to_string(),
        };
        let values = row.values();
        assert_eq!(values.len(), REPORT_HEADERS.len());
        assert_eq!(values[0], "i-1");
        assert_eq!(values[3], "m5.large");
        assert_eq!(values[6], "m5.medium");
    }
}
