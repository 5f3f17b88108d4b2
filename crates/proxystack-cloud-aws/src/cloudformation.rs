//! CloudFormation deployer
//!
//! Every deployment goes through a change set: create, wait, execute, wait.
//! Nothing here is retried; a failed change set or stack operation is
//! reported as-is and CloudFormation's own rollback takes over.

use crate::error::AwsError;
use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::types::{
    Capability, ChangeAction, ChangeSetStatus, ChangeSetType, Replacement, ResourceChange, Stack,
};
use proxystack_cloud::{
    Action, ActionType, AuthStatus, CloudError, DeployResult, Plan, StackDeployer, StackOutput,
    Template, WaitConfig,
};
use tracing::{debug, info, warn};

/// Coarse stack status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPhase {
    InProgress,
    Succeeded,
    Failed,
}

impl StackPhase {
    pub fn from_status(status: &str) -> Self {
        match status {
            s if s.ends_with("_IN_PROGRESS") => StackPhase::InProgress,
            "CREATE_COMPLETE" | "UPDATE_COMPLETE" | "IMPORT_COMPLETE" | "DELETE_COMPLETE" => {
                StackPhase::Succeeded
            }
            _ => StackPhase::Failed,
        }
    }
}

/// CloudFormation rejects change sets that change nothing with one of these
fn is_no_change_reason(reason: &str) -> bool {
    reason.contains("didn't contain changes") || reason.contains("No updates are to be performed")
}

/// Map one CloudFormation resource change onto an [`Action`]
fn action_from_change(change: &ResourceChange) -> Action {
    let action_type = match change.action() {
        Some(ChangeAction::Add) | Some(ChangeAction::Import) => ActionType::Create,
        Some(ChangeAction::Modify) | Some(ChangeAction::Dynamic) => ActionType::Update,
        Some(ChangeAction::Remove) => ActionType::Delete,
        _ => ActionType::NoOp,
    };

    Action {
        logical_id: change.logical_resource_id().unwrap_or_default().to_string(),
        action_type,
        resource_type: change.resource_type().unwrap_or_default().to_string(),
        replacement: matches!(
            change.replacement(),
            Some(Replacement::True) | Some(Replacement::Conditional)
        ),
    }
}

/// Plan for a stack that does not exist yet: everything is created
fn creation_plan(template: &Template) -> Plan {
    Plan::new(
        template
            .resources
            .iter()
            .map(|(id, resource)| Action {
                logical_id: id.clone(),
                action_type: ActionType::Create,
                resource_type: resource.resource_type.clone(),
                replacement: false,
            })
            .collect(),
    )
}

fn stack_outputs(stack: &Stack) -> Vec<StackOutput> {
    stack
        .outputs()
        .iter()
        .map(|o| StackOutput {
            key: o.output_key().unwrap_or_default().to_string(),
            value: o.output_value().unwrap_or_default().to_string(),
            description: o.description().map(str::to_string),
            export_name: o.export_name().map(str::to_string),
        })
        .collect()
}

fn stack_status(stack: &Stack) -> String {
    stack
        .stack_status()
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

/// Outcome of waiting on a change set
enum ChangeSetOutcome {
    Ready(Plan),
    NoChanges,
}

/// Wait for a change set and delete it unless it is ready and about to be
/// executed
async fn settle_change_set<W, D, F>(
    wait: W,
    execute_when_ready: bool,
    delete: D,
) -> proxystack_cloud::Result<ChangeSetOutcome>
where
    W: Future<Output = proxystack_cloud::Result<ChangeSetOutcome>>,
    D: FnOnce() -> F,
    F: Future<Output = ()>,
{
    let outcome = wait.await;
    let keep = execute_when_ready && matches!(outcome, Ok(ChangeSetOutcome::Ready(_)));
    if !keep {
        delete().await;
    }
    outcome
}

pub struct CloudFormationDeployer {
    client: Client,
    stack_name: String,
    region: String,
    wait: WaitConfig,
}

impl CloudFormationDeployer {
    pub async fn new(stack_name: impl Into<String>, region: impl Into<String>) -> Self {
        let region = region.into();
        let config = crate::load_sdk_config(&region).await;
        Self {
            client: Client::new(&config),
            stack_name: stack_name.into(),
            region,
            wait: WaitConfig::default(),
        }
    }

    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Current stack, `None` if it does not exist
    async fn describe_stack(&self) -> crate::Result<Option<Stack>> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(&self.stack_name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.stacks().first().cloned()),
            Err(e) => {
                let err = AwsError::from_sdk("DescribeStacks", &e);
                if err.is_stack_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn create_change_set(
        &self,
        template: &Template,
        change_set_type: ChangeSetType,
    ) -> proxystack_cloud::Result<String> {
        let name = format!("proxystack-{}", chrono::Utc::now().format("%Y%m%d%H%M%S"));
        info!(
            stack = %self.stack_name,
            change_set = %name,
            change_set_type = %change_set_type.as_str(),
            "Creating change set"
        );

        let output = self
            .client
            .create_change_set()
            .stack_name(&self.stack_name)
            .change_set_name(&name)
            .change_set_type(change_set_type)
            .template_body(template.to_json_pretty()?)
            .capabilities(Capability::CapabilityIam)
            .description("proxystack deployment")
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateChangeSet", &e))?;

        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| CloudError::ChangeSetFailed("no change set id returned".to_string()))
    }

    async fn wait_for_change_set(&self, id: &str) -> proxystack_cloud::Result<ChangeSetOutcome> {
        for _ in 0..self.wait.max_polls() {
            let mut actions = Vec::new();
            let mut next_token: Option<String> = None;
            let status;
            let reason;

            loop {
                let output = self
                    .client
                    .describe_change_set()
                    .stack_name(&self.stack_name)
                    .change_set_name(id)
                    .set_next_token(next_token.take())
                    .send()
                    .await
                    .map_err(|e| AwsError::from_sdk("DescribeChangeSet", &e))?;

                actions.extend(
                    output
                        .changes()
                        .iter()
                        .filter_map(|c| c.resource_change())
                        .map(action_from_change),
                );

                next_token = output.next_token().map(str::to_string);
                if next_token.is_none() {
                    status = output.status().cloned();
                    reason = output.status_reason().unwrap_or_default().to_string();
                    break;
                }
            }

            match status {
                Some(ChangeSetStatus::CreateComplete) => {
                    return Ok(ChangeSetOutcome::Ready(Plan::new(actions)));
                }
                Some(ChangeSetStatus::Failed) if is_no_change_reason(&reason) => {
                    return Ok(ChangeSetOutcome::NoChanges);
                }
                Some(ChangeSetStatus::Failed) => {
                    return Err(CloudError::ChangeSetFailed(reason));
                }
                other => {
                    debug!(status = ?other, "Change set not ready yet");
                }
            }

            tokio::time::sleep(self.wait.poll_interval).await;
        }

        Err(CloudError::Timeout(format!(
            "change set {} did not become ready",
            id
        )))
    }

    async fn delete_change_set(&self, id: &str) {
        if let Err(e) = self
            .client
            .delete_change_set()
            .stack_name(&self.stack_name)
            .change_set_name(id)
            .send()
            .await
        {
            warn!(
                change_set = %id,
                error = %AwsError::from_sdk("DeleteChangeSet", &e),
                "Failed to delete change set"
            );
        }
    }

    /// Poll until the stack leaves its in-progress state
    ///
    /// A vanished stack counts as `DELETE_COMPLETE`.
    async fn wait_for_stack(&self) -> proxystack_cloud::Result<(StackPhase, Option<Stack>)> {
        for _ in 0..self.wait.max_polls() {
            let Some(stack) = self.describe_stack().await? else {
                return Ok((StackPhase::Succeeded, None));
            };

            let status = stack_status(&stack);
            match StackPhase::from_status(&status) {
                StackPhase::InProgress => {
                    debug!(stack = %self.stack_name, status = %status, "Waiting for stack");
                }
                phase => return Ok((phase, Some(stack))),
            }

            tokio::time::sleep(self.wait.poll_interval).await;
        }

        Err(CloudError::Timeout(format!(
            "stack {} did not settle",
            self.stack_name
        )))
    }

    fn change_set_type_for(&self, existing: Option<&Stack>) -> proxystack_cloud::Result<ChangeSetType> {
        let Some(stack) = existing else {
            return Ok(ChangeSetType::Create);
        };

        match stack_status(stack).as_str() {
            "REVIEW_IN_PROGRESS" => Ok(ChangeSetType::Create),
            "ROLLBACK_COMPLETE" => Err(CloudError::DeployFailed(format!(
                "stack {} is in ROLLBACK_COMPLETE and must be destroyed before redeploying",
                self.stack_name
            ))),
            status if StackPhase::from_status(status) == StackPhase::InProgress => {
                Err(CloudError::DeployFailed(format!(
                    "stack {} is busy ({})",
                    self.stack_name, status
                )))
            }
            _ => Ok(ChangeSetType::Update),
        }
    }
}

#[async_trait]
impl StackDeployer for CloudFormationDeployer {
    fn name(&self) -> &str {
        "cloudformation"
    }

    fn stack_name(&self) -> &str {
        &self.stack_name
    }

    async fn check_auth(&self) -> proxystack_cloud::Result<AuthStatus> {
        match self.client.describe_stacks().send().await {
            Ok(_) => Ok(AuthStatus::ok(format!("region {}", self.region))),
            Err(e) => Ok(AuthStatus::failed(
                AwsError::from_sdk("DescribeStacks", &e).to_string(),
            )),
        }
    }

    async fn plan(&self, template: &Template) -> proxystack_cloud::Result<Plan> {
        let existing = self.describe_stack().await?;
        let change_set_type = self.change_set_type_for(existing.as_ref())?;

        if change_set_type == ChangeSetType::Create {
            return Ok(creation_plan(template));
        }

        let id = self.create_change_set(template, change_set_type).await?;
        let outcome = settle_change_set(self.wait_for_change_set(&id), false, || {
            self.delete_change_set(&id)
        })
        .await?;

        match outcome {
            ChangeSetOutcome::Ready(plan) => Ok(plan),
            ChangeSetOutcome::NoChanges => Ok(Plan::empty()),
        }
    }

    async fn deploy(&self, template: &Template) -> proxystack_cloud::Result<DeployResult> {
        let start = std::time::Instant::now();

        let existing = self.describe_stack().await?;
        let change_set_type = self.change_set_type_for(existing.as_ref())?;

        let id = self.create_change_set(template, change_set_type).await?;
        let outcome = settle_change_set(self.wait_for_change_set(&id), true, || {
            self.delete_change_set(&id)
        })
        .await?;

        let plan = match outcome {
            ChangeSetOutcome::Ready(plan) => plan,
            ChangeSetOutcome::NoChanges => {
                info!(stack = %self.stack_name, "No changes to deploy");
                let stack = existing.ok_or_else(|| {
                    CloudError::StackNotFound(self.stack_name.clone())
                })?;
                return Ok(DeployResult {
                    stack_id: stack.stack_id().map(str::to_string),
                    status: stack_status(&stack),
                    plan: Plan::empty(),
                    outputs: stack_outputs(&stack),
                    duration_ms: start.elapsed().as_millis() as u64,
                });
            }
        };

        info!(
            stack = %self.stack_name,
            summary = %plan.summary(),
            "Executing change set"
        );
        self.client
            .execute_change_set()
            .stack_name(&self.stack_name)
            .change_set_name(&id)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("ExecuteChangeSet", &e))?;

        let (phase, stack) = self.wait_for_stack().await?;
        let stack = stack.ok_or_else(|| CloudError::StackNotFound(self.stack_name.clone()))?;
        let status = stack_status(&stack);

        if phase == StackPhase::Failed {
            return Err(CloudError::DeployFailed(format!(
                "{}: {}",
                status,
                stack.stack_status_reason().unwrap_or("no reason reported")
            )));
        }

        info!(stack = %self.stack_name, status = %status, "Deployment finished");

        Ok(DeployResult {
            stack_id: stack.stack_id().map(str::to_string),
            status,
            plan,
            outputs: stack_outputs(&stack),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn outputs(&self) -> proxystack_cloud::Result<Vec<StackOutput>> {
        let stack = self
            .describe_stack()
            .await?
            .ok_or_else(|| CloudError::StackNotFound(self.stack_name.clone()))?;
        Ok(stack_outputs(&stack))
    }

    async fn destroy(&self) -> proxystack_cloud::Result<()> {
        if self.describe_stack().await?.is_none() {
            return Err(CloudError::StackNotFound(self.stack_name.clone()));
        }

        info!(stack = %self.stack_name, "Deleting stack");
        self.client
            .delete_stack()
            .stack_name(&self.stack_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DeleteStack", &e))?;

        match self.wait_for_stack().await? {
            (StackPhase::Succeeded, _) => Ok(()),
            (_, stack) => Err(CloudError::DeployFailed(format!(
                "stack deletion failed: {}",
                stack
                    .as_ref()
                    .and_then(|s| s.stack_status_reason())
                    .unwrap_or("no reason reported")
            ))),
        }
    }
}
