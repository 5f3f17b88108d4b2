//! Deployment seam
//!
//! The provisioning engine sits behind [`StackDeployer`]. Implementations
//! submit templates and report what the engine did; they never create or
//! delete individual resources themselves.

use crate::action::Plan;
use crate::error::Result;
use crate::template::Template;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[async_trait]
pub trait StackDeployer: Send + Sync {
    /// Returns the engine name (e.g., "cloudformation")
    fn name(&self) -> &str;

    /// Stack this deployer targets
    fn stack_name(&self) -> &str;

    /// Check that credentials are usable
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Ask the engine what deploying `template` would change
    async fn plan(&self, template: &Template) -> Result<Plan>;

    /// Submit `template` and wait for the engine to settle
    async fn deploy(&self, template: &Template) -> Result<DeployResult>;

    /// Outputs of the deployed stack
    async fn outputs(&self) -> Result<Vec<StackOutput>>;

    /// Tear the whole stack down
    async fn destroy(&self) -> Result<()>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub account_info: Option<String>,
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// One stack output as reported after deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub export_name: Option<String>,
}

/// Result of a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployResult {
    pub stack_id: Option<String>,

    /// Final stack status (e.g., "CREATE_COMPLETE")
    pub status: String,

    /// Changes the engine applied
    pub plan: Plan,

    pub outputs: Vec<StackOutput>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl DeployResult {
    pub fn output(&self, key: &str) -> Option<&StackOutput> {
        self.outputs.iter().find(|o| o.key == key)
    }
}

/// Polling configuration while waiting on the engine
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay between status checks
    pub poll_interval: Duration,

    /// Give up after this long
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(30 * 60),
        }
    }
}

impl WaitConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of polls that fit in the timeout
    pub fn max_polls(&self) -> u64 {
        let interval = self.poll_interval.as_millis().max(1);
        (self.timeout.as_millis() / interval).max(1) as u64
    }
}
