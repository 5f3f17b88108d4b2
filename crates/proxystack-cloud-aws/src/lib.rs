//! AWS deployment for proxystack
//!
//! [`CloudFormationDeployer`] implements
//! [`StackDeployer`](proxystack_cloud::StackDeployer) on top of CloudFormation
//! change sets. CloudFormation does the diffing and resource lifecycle; this
//! crate submits the template, waits, and reports.
//!
//! # Requirements
//!
//! - AWS credentials resolvable by the default provider chain
//!   (environment, `~/.aws/credentials`, SSO, instance role)
//!
//! # Example
//!
//! ```ignore
//! use proxystack_cloud::StackDeployer;
//! use proxystack_cloud_aws::CloudFormationDeployer;
//!
//! let deployer = CloudFormationDeployer::new("AwsProxyServerStack", "us-east-1").await;
//! let result = deployer.deploy(&template).await?;
//! println!("{}", result.status);
//! ```

pub mod cloudformation;
pub mod error;
pub mod network;

pub use cloudformation::{CloudFormationDeployer, StackPhase};
pub use error::{AwsError, Result};
pub use network::lookup_default_network;

/// Shared SDK configuration for one region
pub async fn load_sdk_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await
}
