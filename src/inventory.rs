//! Instance inventory collection
//!
//! Enumerates every region in the account, then every running EC2 instance
//! in each region. The listing APIs sit behind the [`InstanceSource`] trait
//! so the pipeline can be exercised against in-memory fakes.
//!
//! Failure policy: a region-listing failure empties the whole inventory
//! (logged, not fatal); a per-region instance-listing failure skips that
//! region and collection continues. No retries.

use crate::error::{Result, RightsizerError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::types::Filter;
use aws_sdk_ec2::Client as Ec2Client;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Display name used when an instance carries no `Name` tag
pub const UNNAMED: &str = "N/A";

/// One running instance, as enumerated from the account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    pub region: String,
    pub instance_type: String,
    pub name: String,
}

/// Narrow capability over the EC2 listing APIs
#[async_trait]
pub trait InstanceSource: Send + Sync {
    /// All region names visible to the account
    async fn list_regions(&self) -> Result<Vec<String>>;

    /// Running instances in one region
    async fn list_running(&self, region: &str) -> Result<Vec<InstanceRecord>>;
}

/// Inventory for the whole account, ordered by region as enumerated
pub async fn collect_inventory(
    source: &dyn InstanceSource,
) -> Vec<(String, Vec<InstanceRecord>)> {
    let regions = match source.list_regions().await {
        Ok(regions) => regions,
        Err(e) => {
            error!("Error describing regions: {}", e);
            return Vec::new();
        }
    };

    let mut inventory = Vec::new();
    for region in regions {
        match source.list_running(&region).await {
            Ok(instances) => {
                if !instances.is_empty() {
                    inventory.push((region, instances));
                }
            }
            Err(e) => {
                warn!("Skipping region {}: {}", region, e);
            }
        }
    }
    inventory
}

/// Live EC2 implementation of [`InstanceSource`]
pub struct Ec2InstanceSource;

impl Ec2InstanceSource {
    async fn regional_client(&self, region: &str) -> Ec2Client {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Ec2Client::new(&config)
    }
}

#[async_trait]
impl InstanceSource for Ec2InstanceSource {
    async fn list_regions(&self) -> Result<Vec<String>> {
        let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let client = Ec2Client::new(&aws_config);

        let response = client
            .describe_regions()
            .send()
            .await
            .map_err(|e| RightsizerError::Aws(format!("Failed to describe regions: {}", e)))?;

        Ok(response
            .regions()
            .iter()
            .filter_map(|r| r.region_name().map(|n| n.to_string()))
            .collect())
    }

    async fn list_running(&self, region: &str) -> Result<Vec<InstanceRecord>> {
        let client = self.regional_client(region).await;

        let response = client
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("instance-state-name")
                    .values("running")
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                RightsizerError::Aws(format!("Failed to list instances in {}: {}", region, e))
            })?;

        let mut instances = Vec::new();
        for reservation in response.reservations() {
            for instance in reservation.instances() {
                let Some(instance_id) = instance.instance_id() else {
                    continue;
                };
                let instance_type = instance
                    .instance_type()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_else(|| "unknown".to_string());

                // First Name tag wins; absence yields the sentinel
                let name = instance
                    .tags()
                    .iter()
                    .find(|tag| tag.key() == Some("Name"))
                    .and_then(|tag| tag.value())
                    .unwrap_or(UNNAMED)
                    .to_string();

                instances.push(InstanceRecord {
                    id: instance_id.to_string(),
                    region: region.to_string(),
                    instance_type,
                    name,
                });
            }
        }
        Ok(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeSource {
        regions: Result<Vec<String>>,
        instances: HashMap<String, Result<Vec<InstanceRecord>>>,
    }

    fn record(id: &str, region: &str, instance_type: &str) -> InstanceRecord {
        InstanceRecord {
            id: id.to_string(),
            region: region.to_string(),
            instance_type: instance_type.to_string(),
            name: UNNAMED.to_string(),
        }
    }

    #[async_trait]
    impl InstanceSource for FakeSource {
        async fn list_regions(&self) -> Result<Vec<String>> {
            match &self.regions {
                Ok(r) => Ok(r.clone()),
                Err(_) => Err(RightsizerError::Aws("regions unavailable".to_string())),
            }
        }

        async fn list_running(&self, region: &str) -> Result<Vec<InstanceRecord>> {
            match self.instances.get(region) {
                Some(Ok(list)) => Ok(list.clone()),
                Some(Err(_)) => Err(RightsizerError::Aws(format!("{} unavailable", region))),
                None => Ok(Vec::new()),
            }
        }
    }

    #[tokio::test]
    async fn test_region_listing_failure_empties_inventory() {
        let source = FakeSource {
            regions: Err(RightsizerError::Aws("denied".to_string())),
            instances: HashMap::new(),
        };
        let inventory = collect_inventory(&source).await;
        assert!(inventory.is_empty());
    }

    #[tokio::test]
    async fn test_failed_region_is_skipped() {
        let mut instances = HashMap::new();
        instances.insert(
            "us-east-1".to_string(),
            Ok(vec![record("i-1", "us-east-1", "m5.large")]),
        );
        instances.insert(
            "eu-west-1".to_string(),
            Err(RightsizerError::Aws("throttled".to_string())),
        );
        instances.insert(
            "ap-south-1".to_string(),
            Ok(vec![record("i-2", "ap-south-1", "t3.large")]),
        );

        let source = FakeSource {
            regions: Ok(vec![
                "us-east-1".to_string(),
                "eu-west-1".to_string(),
                "ap-south-1".to_string(),
            ]),
            instances,
        };

        let inventory = collect_inventory(&source).await;
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].0, "us-east-1");
        assert_eq!(inventory[1].0, "ap-south-1");
        assert_eq!(inventory[1].1[0].id, "i-2");
    }

    #[tokio::test]
    async fn test_empty_regions_are_omitted() {
        let mut instances = HashMap::new();
        instances.insert("us-east-1".to_string(), Ok(Vec::new()));

        let source = FakeSource {
            regions: Ok(vec!["us-east-1".to_string()]),
            instances,
        };

        let inventory = collect_inventory(&source).await;
        assert!(inventory.is_empty());
    }
}
