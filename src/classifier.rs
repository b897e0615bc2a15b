//! Threshold classification and downsize recommendations
//!
//! Rules run in a fixed order for each instance:
//!
//! 1. Exclusion: unparseable type strings and sizes in the ignore set are
//!    dropped before any metric is consulted.
//! 2. Burst-credit guard: a burstable-class instance (type starts with `t`)
//!    with a measured credit average below the threshold needs manual
//!    review. Low CPU on a throttled burstable instance is misleading, so
//!    no downsize is suggested.
//! 3. Utilization: average CPU below the threshold flags the instance as
//!    underutilized with a naive one-tier step-down recommendation.
//!
//! The step-down table maps each known size tier to its immediate smaller
//! neighbor and bottoms out at `small`. When the next tier down is itself in
//! the ignore set, the recommendation asks for manual review instead of
//! suggesting a tier the report would never flag.

use crate::config::AnalysisConfig;
use crate::metrics::MetricSample;
use std::fmt;

/// Size tiers mapped to their immediate smaller neighbor.
/// Total over known tiers, never skips a tier.
const SIZE_STEP_DOWN: &[(&str, &str)] = &[
    ("32xlarge", "24xlarge"),
    ("24xlarge", "16xlarge"),
    ("16xlarge", "12xlarge"),
    ("12xlarge", "8xlarge"),
    ("8xlarge", "4xlarge"),
    ("4xlarge", "2xlarge"),
    ("2xlarge", "xlarge"),
    ("xlarge", "large"),
    ("large", "medium"),
    ("medium", "small"),
];

/// Split `family.size`, requiring exactly two non-empty dot-separated tokens
pub fn parse_instance_type(instance_type: &str) -> Option<(&str, &str)> {
    let mut parts = instance_type.split('.');
    let family = parts.next()?;
    let size = parts.next()?;
    if parts.next().is_some() || family.is_empty() || size.is_empty() {
        return None;
    }
    Some((family, size))
}

/// Next size tier down, if the tier is in the table
pub fn step_down(size: &str) -> Option<&'static str> {
    SIZE_STEP_DOWN
        .iter()
        .find(|(from, _)| *from == size)
        .map(|(_, to)| *to)
}

/// Outcome of the downsize recommendation for a flagged instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    /// A concrete smaller type, e.g. `m5.xlarge`
    Downsize(String),
    /// The next tier down is in the ignore set; names that tier
    ReviewStepDownIgnored(String),
    /// Current size has no mapped smaller tier
    ReviewNoSmallerSize,
    /// Type string did not parse as `family.size`
    ReviewComplexType,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Downsize(target) => write!(f, "{}", target),
            Recommendation::ReviewStepDownIgnored(tier) => {
                write!(f, "Review manually (next step-down is {})", tier)
            }
            Recommendation::ReviewNoSmallerSize => {
                write!(f, "Review manually (no smaller size in map)")
            }
            Recommendation::ReviewComplexType => write!(f, "Review manually (complex type)"),
        }
    }
}

/// Classification of one instance against the threshold rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Ignore-size or unparseable type; never reported
    Excluded,
    /// Metrics within thresholds; not reported
    NotFlagged,
    /// Burstable instance with a low credit balance; reported for review
    LowCredits,
    /// CPU below threshold; reported with a downsize recommendation
    Underutilized(Recommendation),
}

impl Classification {
    pub fn is_flagged(&self) -> bool {
        matches!(
            self,
            Classification::LowCredits | Classification::Underutilized(_)
        )
    }
}

/// Naive one-tier step-down for an underutilized instance
pub fn recommend(instance_type: &str, config: &AnalysisConfig) -> Recommendation {
    let Some((family, size)) = parse_instance_type(instance_type) else {
        return Recommendation::ReviewComplexType;
    };

    match step_down(size) {
        Some(smaller) if config.ignore_sizes.iter().any(|s| s == smaller) => {
            Recommendation::ReviewStepDownIgnored(smaller.to_string())
        }
        Some(smaller) => Recommendation::Downsize(format!("{}.{}", family, smaller)),
        None => Recommendation::ReviewNoSmallerSize,
    }
}

/// Apply the threshold rules, in order, to one instance
pub fn classify(
    instance_type: &str,
    sample: &MetricSample,
    config: &AnalysisConfig,
) -> Classification {
    let Some((_, size)) = parse_instance_type(instance_type) else {
        return Classification::Excluded;
    };
    if config.ignore_sizes.iter().any(|s| s == size) {
        return Classification::Excluded;
    }

    if instance_type.starts_with('t') {
        if let Some(credit_avg) = sample.credit_avg {
            if credit_avg < config.credit_threshold {
                return Classification::LowCredits;
            }
        }
    }

    if sample.cpu_avg < config.cpu_threshold_percent {
        return Classification::Underutilized(recommend(instance_type, config));
    }

    Classification::NotFlagged
}
