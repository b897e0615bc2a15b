//! Error types for rightsizer
//!
//! Library code uses `crate::error::Result<T>` which returns `RightsizerError`.
//! CLI code uses `anyhow::Result<T>` for top-level error handling; the
//! conversion happens at the CLI boundary so error chains survive intact.
//!
//! ## Failure policy
//!
//! The report pipeline is deliberately best-effort: enumeration and metrics
//! failures degrade the result set (skip a region, fall back to default
//! metric values) rather than aborting the run. The only errors that reach
//! the caller are configuration problems, local I/O failures, and sink
//! failures other than the expected "sheet already exists" case. There is
//! no retry layer; a failed remote call is logged once and absorbed.

use thiserror::Error;

/// Main error type for rightsizer
#[derive(Error, Debug)]
pub enum RightsizerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("AWS SDK error: {0}")]
    Aws(String),

    #[error("Metrics error for {instance_id} in {region}: {message}")]
    Metrics {
        instance_id: String,
        region: String,
        message: String,
    },

    #[error("Spreadsheet error: {0}")]
    Sheet(String),

    #[error("Worksheet already exists: {0}")]
    SheetExists(String),

    #[error("Secrets error: {0}")]
    Secrets(String),

    #[error("Validation error: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RightsizerError>;

impl RightsizerError {
    /// True for the "worksheet for today already exists" condition, which a
    /// publish run logs and skips rather than treating as a failure.
    pub fn is_sheet_exists(&self) -> bool {
        matches!(self, RightsizerError::SheetExists(_))
    }
}
