//! Default VPC lookup
//!
//! Pins the security group and instance to the default VPC explicitly
//! instead of relying on CloudFormation's implicit placement.

use crate::error::{AwsError, Result};
use aws_sdk_ec2::types::Filter;
use proxystack_cloud::NetworkContext;
use tracing::info;

/// Find the default VPC and its default subnet in the first availability zone
pub async fn lookup_default_network(region: &str) -> Result<NetworkContext> {
    let config = crate::load_sdk_config(region).await;
    let client = aws_sdk_ec2::Client::new(&config);

    let vpcs = client
        .describe_vpcs()
        .filters(Filter::builder().name("isDefault").values("true").build())
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("DescribeVpcs", &e))?;

    let vpc_id = vpcs
        .vpcs()
        .first()
        .and_then(|v| v.vpc_id())
        .ok_or_else(|| AwsError::NoDefaultVpc(region.to_string()))?
        .to_string();

    let subnets = client
        .describe_subnets()
        .filters(Filter::builder().name("vpc-id").values(&vpc_id).build())
        .filters(
            Filter::builder()
                .name("default-for-az")
                .values("true")
                .build(),
        )
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("DescribeSubnets", &e))?;

    let candidates: Vec<(&str, &str)> = subnets
        .subnets()
        .iter()
        .filter_map(|s| Some((s.availability_zone()?, s.subnet_id()?)))
        .collect();
    let subnet_id = pick_subnet(&candidates);

    info!(vpc_id = %vpc_id, subnet_id = ?subnet_id, "Resolved default network");

    Ok(NetworkContext { vpc_id, subnet_id })
}

/// Lowest availability zone wins so repeated lookups agree
fn pick_subnet(candidates: &[(&str, &str)]) -> Option<String> {
    candidates
        .iter()
        .min_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(b.1)))
        .map(|(_, id)| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_subnet_lowest_zone() {
        let candidates = [
            ("us-east-1c", "subnet-ccc"),
            ("us-east-1a", "subnet-aaa"),
            ("us-east-1b", "subnet-bbb"),
        ];
        assert_eq!(pick_subnet(&candidates).as_deref(), Some("subnet-aaa"));
    }

    #[test]
    fn test_pick_subnet_empty() {
        assert_eq!(pick_subnet(&[]), None);
    }
}
