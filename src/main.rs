use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rightsizer::config::{self, Config};
use rightsizer::export;
use rightsizer::inventory::{collect_inventory, Ec2InstanceSource};
use rightsizer::metrics::CloudWatchMetricsSource;
use rightsizer::report::{build_report, print_report, ReportOutcome, ReportRow};
use rightsizer::secrets;
use rightsizer::sheet::{publish_report, GoogleSheetsClient};

#[derive(Parser)]
#[command(name = "rightsizer")]
#[command(
    about = "EC2 rightsizing report generator",
    long_about = "rightsizer enumerates running EC2 instances across all regions, pulls 30 days\nof CloudWatch utilization data for each, and flags underutilized instances\nwith a naive downsize recommendation.\n\nOutputs:\n  - Terminal table + CSV file (rightsizer report)\n  - Dated worksheet in a Google spreadsheet (rightsizer publish)\n\nResizing is a manual follow-up step; this tool never modifies instances."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the report and write it to a CSV file
    Report {
        /// Report file path (default from config, report.csv)
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,
    },
    /// Generate the report and publish it to a dated Google Sheets worksheet
    Publish {
        /// Spreadsheet key (falls back to GOOGLE_SHEET_KEY or config)
        #[arg(long, env = "GOOGLE_SHEET_KEY")]
        sheet_key: Option<String>,
        /// Secrets Manager ARN holding the Google access token
        /// (falls back to GOOGLE_SECRET_ARN or config)
        #[arg(long, env = "GOOGLE_SECRET_ARN")]
        secret_arn: Option<String>,
    },
    /// Initialize a configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = ".rightsizer.toml")]
        output: PathBuf,
    },
}

async fn analyze(config: &Config) -> Vec<ReportRow> {
    println!("Finding running instances...");
    let source = Ec2InstanceSource;
    let inventory = collect_inventory(&source).await;

    println!("Generating rightsizing report...");
    let metrics = CloudWatchMetricsSource::new(config.analysis.clone());
    build_report(&inventory, &metrics, &config.analysis).await
}

async fn run_report(config: &Config, file: Option<PathBuf>, output: &str) -> Result<()> {
    let rows = analyze(config).await;

    if output == "json" {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_report(&rows);
    }

    let path = file.unwrap_or_else(|| config.output.csv_path.clone());
    match export::write_csv(&rows, &path)? {
        ReportOutcome::Written { rows } => {
            println!("Successfully generated report: {} ({} rows)", path.display(), rows);
        }
        _ => {
            println!("No underutilized instances found. No report generated.");
        }
    }
    Ok(())
}

async fn run_publish(
    config: &Config,
    sheet_key: Option<String>,
    secret_arn: Option<String>,
) -> Result<()> {
    let sheet_key = sheet_key.or_else(|| config.sheet_key()).ok_or_else(|| {
        anyhow::anyhow!("No spreadsheet key: set --sheet-key, GOOGLE_SHEET_KEY, or [sheet] in config")
    })?;
    let secret_arn = secret_arn.or_else(|| config.secret_arn()).ok_or_else(|| {
        anyhow::anyhow!("No secret ARN: set --secret-arn, GOOGLE_SECRET_ARN, or [sheet] in config")
    })?;

    println!("Starting Rightsizing Analysis (Google Sheets)...");
    let rows = analyze(config).await;

    let token = secrets::fetch_access_token(&secret_arn).await?;
    let client = GoogleSheetsClient::new(sheet_key, token);

    let summary = match publish_report(&client, &rows, Utc::now()).await? {
        ReportOutcome::Written { rows } => json!({ "status": "Success", "count": rows }),
        ReportOutcome::Empty => json!({ "status": "Success", "count": 0 }),
        ReportOutcome::SkippedExisting(title) => {
            json!({ "status": "Skipped", "sheet": title, "count": rows.len() })
        }
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging - suppress INFO by default, only show warnings and errors
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Report { file } => {
            run_report(&config, file, &cli.output).await?;
        }
        Commands::Publish {
            sheet_key,
            secret_arn,
        } => {
            run_publish(&config, sheet_key, secret_arn).await?;
        }
        Commands::Init { output } => {
            config::init_config(&output)?;
        }
    }

    Ok(())
}
