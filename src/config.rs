use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub sheet: Option<SheetConfig>,
}

/// Thresholds and window for the classification rules.
///
/// These are passed explicitly into the classifier and metrics fetcher so
/// tests can vary them without touching global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Average CPU percentage below which an instance is flagged
    pub cpu_threshold_percent: f64,
    /// Average CPU credit balance below which a burstable instance needs review
    pub credit_threshold: f64,
    /// Trailing reporting window in days
    pub window_days: i64,
    /// CloudWatch sampling period in seconds (86400 = one point per day)
    pub period_seconds: i32,
    /// Instance sizes considered already minimal and excluded from the report
    pub ignore_sizes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// CSV report path, overwritten on each run
    pub csv_path: PathBuf,
}

/// Google Sheets publishing target.
///
/// Both values can be supplied via environment (`GOOGLE_SHEET_KEY`,
/// `GOOGLE_SECRET_ARN`), which takes precedence over the config file. The
/// secret holds the service-account access token used against the Sheets API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub sheet_key: Option<String>,
    pub secret_arn: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            output: OutputConfig {
                csv_path: PathBuf::from("report.csv"),
            },
            sheet: Some(SheetConfig {
                sheet_key: None,
                secret_arn: None,
            }),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cpu_threshold_percent: 20.0,
            credit_threshold: 100.0,
            window_days: 30,
            period_seconds: 86_400,
            ignore_sizes: vec![
                "small".to_string(),
                "micro".to_string(),
                "nano".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            // Try .rightsizer.toml in current dir, then ~/.config/rightsizer/config.toml
            let local = PathBuf::from(".rightsizer.toml");
            if local.exists() {
                local
            } else {
                dirs::config_dir()
                    .map(|d| d.join("rightsizer").join("config.toml"))
                    .unwrap_or_else(|| PathBuf::from(".rightsizer.toml"))
            }
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", config_path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            if path.is_some() {
                eprintln!("WARNING: Config file not found: {}", config_path.display());
                eprintln!("   Using default configuration. Run 'rightsizer init' to create one.");
            }
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.analysis.window_days <= 0 {
            anyhow::bail!("analysis.window_days must be positive");
        }
        if self.analysis.period_seconds <= 0 {
            anyhow::bail!("analysis.period_seconds must be positive");
        }
        if !(0.0..=100.0).contains(&self.analysis.cpu_threshold_percent) {
            anyhow::bail!("analysis.cpu_threshold_percent must be within 0..=100");
        }
        Ok(())
    }

    /// Resolve the spreadsheet key, env var first
    pub fn sheet_key(&self) -> Option<String> {
        std::env::var("GOOGLE_SHEET_KEY").ok().or_else(|| {
            self.sheet
                .as_ref()
                .and_then(|s| s.sheet_key.clone())
        })
    }

    /// Resolve the credentials secret ARN, env var first
    pub fn secret_arn(&self) -> Option<String> {
        std::env::var("GOOGLE_SECRET_ARN").ok().or_else(|| {
            self.sheet
                .as_ref()
                .and_then(|s| s.secret_arn.clone())
        })
    }
}

pub fn init_config(output: &Path) -> Result<()> {
    let config = Config::default();
    config.save(output)?;
    println!("Created config file: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.analysis.cpu_threshold_percent, 20.0);
        assert_eq!(config.analysis.credit_threshold, 100.0);
        assert_eq!(config.analysis.window_days, 30);
        assert_eq!(config.analysis.period_seconds, 86_400);
        assert_eq!(
            config.analysis.ignore_sizes,
            vec!["small", "micro", "nano"]
        );
        assert_eq!(config.output.csv_path, PathBuf::from("report.csv"));
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let config = Config::default();
        assert!(config.save(&config_path).is_ok());
        assert!(config_path.exists());

        let loaded = Config::load(Some(&config_path)).unwrap();
        assert_eq!(
            loaded.analysis.cpu_threshold_percent,
            config.analysis.cpu_threshold_percent
        );
        assert_eq!(loaded.analysis.ignore_sizes, config.analysis.ignore_sizes);
    }

    #[test]
    fn test_config_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let fake_path = temp_dir.path().join("nonexistent.toml");

        // Should return default config
        let config = Config::load(Some(&fake_path)).unwrap();
        assert_eq!(config.analysis.window_days, 30);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&config_path, "invalid toml content {").unwrap();

        let result = Config::load(Some(&config_path));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_bad_thresholds() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        let mut config = Config::default();
        config.analysis.cpu_threshold_percent = 150.0;
        config.save(&config_path).unwrap();

        assert!(Config::load(Some(&config_path)).is_err());
    }

    #[test]
    fn test_init_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("init_test.toml");

        assert!(init_config(&config_path).is_ok());
        assert!(config_path.exists());

        let config = Config::load(Some(&config_path)).unwrap();
        assert!(config.sheet.is_some());
    }
}
