//! Property-based tests for the classifier
//!
//! These tests use proptest to generate random inputs and verify that the
//! classification rules hold across a wide range of instance types and
//! metric values.

use proptest::prelude::*;
use rightsizer::classifier::{classify, parse_instance_type, recommend, Classification, Recommendation};
use rightsizer::config::AnalysisConfig;
use rightsizer::metrics::MetricSample;

fn family() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][0-9][a-z]{0,2}").unwrap()
}

fn mapped_size() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("32xlarge"),
        Just("24xlarge"),
        Just("16xlarge"),
        Just("12xlarge"),
        Just("8xlarge"),
        Just("4xlarge"),
        Just("2xlarge"),
        Just("xlarge"),
        Just("large"),
        Just("medium"),
    ]
}

fn ignore_size() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("small"), Just("micro"), Just("nano")]
}

fn sample_strategy() -> impl Strategy<Value = MetricSample> {
    (0.0f64..100.0, proptest::option::of(0.0f64..1000.0))
        .prop_map(|(cpu_avg, credit_avg)| MetricSample { cpu_avg, credit_avg })
}

proptest! {
    #[test]
    fn ignore_sizes_are_never_flagged(
        family in family(),
        size in ignore_size(),
        sample in sample_strategy()
    ) {
        let config = AnalysisConfig::default();
        let instance_type = format!("{}.{}", family, size);
        prop_assert_eq!(
            classify(&instance_type, &sample, &config),
            Classification::Excluded
        );
    }

    #[test]
    fn unparseable_types_are_never_flagged(
        raw in "[a-z0-9]{1,12}",
        sample in sample_strategy()
    ) {
        // No dot at all, or more than one
        let config = AnalysisConfig::default();
        prop_assert_eq!(classify(&raw, &sample, &config), Classification::Excluded);
        let triple = format!("db.{}.large", raw);
        prop_assert_eq!(classify(&triple, &sample, &config), Classification::Excluded);
    }

    #[test]
    fn healthy_cpu_is_never_flagged(
        family in family(),
        size in mapped_size(),
        cpu in 20.0f64..100.0
    ) {
        let config = AnalysisConfig::default();
        let instance_type = format!("{}.{}", family, size);
        let sample = MetricSample { cpu_avg: cpu, credit_avg: None };
        prop_assert_eq!(
            classify(&instance_type, &sample, &config),
            Classification::NotFlagged
        );
    }

    #[test]
    fn low_credit_burstable_never_gets_a_downsize(
        size in mapped_size(),
        cpu in 0.0f64..100.0,
        credits in 0.0f64..100.0
    ) {
        // Regardless of CPU, the credit guard wins for t-class instances
        let config = AnalysisConfig::default();
        let instance_type = format!("t3.{}", size);
        let sample = MetricSample { cpu_avg: cpu, credit_avg: Some(credits) };
        if credits < config.credit_threshold {
            prop_assert_eq!(
                classify(&instance_type, &sample, &config),
                Classification::LowCredits
            );
        }
    }

    #[test]
    fn underutilized_recommendation_is_one_tier_down(
        family in family(),
        size in mapped_size(),
        cpu in 0.0f64..20.0
    ) {
        let config = AnalysisConfig::default();
        let instance_type = format!("{}.{}", family, size);
        let sample = MetricSample { cpu_avg: cpu, credit_avg: None };

        // Skip burstable families; the credit guard is covered separately
        prop_assume!(!instance_type.starts_with('t'));

        match classify(&instance_type, &sample, &config) {
            Classification::Underutilized(Recommendation::Downsize(target)) => {
                // Target keeps the family and is itself a parseable type
                let (target_family, target_size) = parse_instance_type(&target).unwrap();
                prop_assert_eq!(target_family, family.as_str());
                prop_assert_ne!(target_size, size);
                // Never recommends an ignored tier outright
                prop_assert!(!config.ignore_sizes.iter().any(|s| s == target_size));
            }
            Classification::Underutilized(Recommendation::ReviewStepDownIgnored(tier)) => {
                // Only reachable when the next tier down is ignored
                prop_assert!(config.ignore_sizes.iter().any(|s| s == &tier));
                prop_assert_eq!(size, "medium");
            }
            other => prop_assert!(false, "unexpected classification: {:?}", other),
        }
    }

    #[test]
    fn recommend_agrees_with_classify_for_underutilized(
        family in family(),
        size in mapped_size()
    ) {
        let config = AnalysisConfig::default();
        let instance_type = format!("{}.{}", family, size);
        prop_assume!(!instance_type.starts_with('t'));

        let sample = MetricSample { cpu_avg: 0.0, credit_avg: None };
        let classified = classify(&instance_type, &sample, &config);
        let direct = recommend(&instance_type, &config);
        prop_assert_eq!(classified, Classification::Underutilized(direct));
    }

    #[test]
    fn parse_round_trips_valid_types(
        family in family(),
        size in mapped_size()
    ) {
        let instance_type = format!("{}.{}", family, size);
        let (parsed_family, parsed_size) = parse_instance_type(&instance_type).unwrap();
        prop_assert_eq!(parsed_family, family.as_str());
        prop_assert_eq!(parsed_size, size);
    }
}
