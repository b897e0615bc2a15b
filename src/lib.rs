//! rightsizer library
//!
//! Core pipeline for the rightsizer CLI: inventory collection, CloudWatch
//! metrics, threshold classification, and the CSV/spreadsheet report sinks.

pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod inventory;
pub mod metrics;
pub mod report;
pub mod secrets;
pub mod sheet;

// Re-export commonly used types
pub use report::{ReportOutcome, ReportRow};
