//! CloudWatch metrics fetching
//!
//! Pulls a fixed trailing window of two time series per instance (CPU
//! utilization and CPU credit balance, one data point per day) and reduces
//! each to its arithmetic mean. Sits behind the [`MetricsSource`] trait so
//! the classifier can be tested without a live account.
//!
//! Any error during the remote query is logged and treated as "no data":
//! the fetch still returns a sample with default values and never raises
//! past this boundary. This means an instance whose metrics were simply
//! unavailable reads as 0% CPU and can be flagged as underutilized; that is
//! a known, accepted limitation of the degrade-to-default policy.

use crate::config::AnalysisConfig;
use crate::error::{Result, RightsizerError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{Dimension, Metric, MetricDataQuery, MetricStat};
use aws_sdk_cloudwatch::Client as CloudWatchClient;
use chrono::{Duration, Utc};
use tracing::warn;

const QUERY_ID_CPU: &str = "m_cpu";
const QUERY_ID_CREDITS: &str = "m_cred";

/// Windowed metric averages for one instance
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// Mean CPU utilization percentage; 0.0 when the series had no data
    pub cpu_avg: f64,
    /// Mean CPU credit balance; `None` when the series had no data or the
    /// instance class does not accrue credits
    pub credit_avg: Option<f64>,
}

impl Default for MetricSample {
    fn default() -> Self {
        Self {
            cpu_avg: 0.0,
            credit_avg: None,
        }
    }
}

/// Narrow capability over the metrics-query API
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Fetch the windowed sample for one instance. Implementations must not
    /// fail: remote errors degrade to [`MetricSample::default`].
    async fn fetch(&self, instance_id: &str, region: &str) -> MetricSample;
}

/// Arithmetic mean of a series; `None` for an empty series
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Live CloudWatch implementation of [`MetricsSource`]
pub struct CloudWatchMetricsSource {
    analysis: AnalysisConfig,
}

impl CloudWatchMetricsSource {
    pub fn new(analysis: AnalysisConfig) -> Self {
        Self { analysis }
    }

    async fn query_window(&self, instance_id: &str, region: &str) -> Result<MetricSample> {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        let client = CloudWatchClient::new(&config);

        let end = Utc::now();
        let start = end - Duration::days(self.analysis.window_days);

        let dimension = Dimension::builder()
            .name("InstanceId")
            .value(instance_id)
            .build();

        let cpu_query = MetricDataQuery::builder()
            .id(QUERY_ID_CPU)
            .metric_stat(
                MetricStat::builder()
                    .metric(
                        Metric::builder()
                            .namespace("AWS/EC2")
                            .metric_name("CPUUtilization")
                            .dimensions(dimension.clone())
                            .build(),
                    )
                    .period(self.analysis.period_seconds)
                    .stat("Average")
                    .build(),
            )
            .return_data(true)
            .build();

        let credit_query = MetricDataQuery::builder()
            .id(QUERY_ID_CREDITS)
            .metric_stat(
                MetricStat::builder()
                    .metric(
                        Metric::builder()
                            .namespace("AWS/EC2")
                            .metric_name("CPUCreditBalance")
                            .dimensions(dimension)
                            .build(),
                    )
                    .period(self.analysis.period_seconds)
                    .stat("Average")
                    .build(),
            )
            .return_data(true)
            .build();

        let response = client
            .get_metric_data()
            .metric_data_queries(cpu_query)
            .metric_data_queries(credit_query)
            .start_time(AwsDateTime::from_secs(start.timestamp()))
            .end_time(AwsDateTime::from_secs(end.timestamp()))
            .send()
            .await
            .map_err(|e| RightsizerError::Metrics {
                instance_id: instance_id.to_string(),
                region: region.to_string(),
                message: e.to_string(),
            })?;

        let mut sample = MetricSample::default();
        for result in response.metric_data_results() {
            let Some(avg) = mean(result.values()) else {
                continue;
            };
            match result.id() {
                Some(QUERY_ID_CPU) => sample.cpu_avg = avg,
                Some(QUERY_ID_CREDITS) => sample.credit_avg = Some(avg),
                _ => {}
            }
        }
        Ok(sample)
    }
}

#[async_trait]
impl MetricsSource for CloudWatchMetricsSource {
    async fn fetch(&self, instance_id: &str, region: &str) -> MetricSample {
        match self.query_window(instance_id, region).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Error getting metrics for {} in {}: {}", instance_id, region, e);
                MetricSample::default()
            }
        }
    }
}
