pub mod deploy;
pub mod destroy;
pub mod diff;
pub mod outputs;
pub mod synth;
pub mod validate;

use colored::Colorize;
use proxystack_cloud::{ActionType, Plan, StackOutput};

/// 変更内容を表示
pub fn print_plan(plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "✓ 変更はありません".green());
        return;
    }

    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update if action.replacement => "±".yellow(),
            ActionType::Update => "~".yellow(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => " ".normal(),
        };
        println!("  {} {}", marker, action.description());
    }
    println!();
    println!("{}", plan.summary().to_string().bold());
}

/// 出力値を表示
pub fn print_outputs(outputs: &[StackOutput]) {
    if outputs.is_empty() {
        println!("{}", "出力値はありません".yellow());
        return;
    }

    let width = outputs.iter().map(|o| o.key.len()).max().unwrap_or(0);
    for output in outputs {
        println!(
            "  {}  {}",
            format!("{:width$}", output.key, width = width).cyan(),
            output.value
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use proxystack_cloud::{
        AuthStatus, CloudError, DeployResult, Plan, StackDeployer, StackOutput, Template,
    };
    use std::sync::Mutex;

    /// In-memory deployer recording which operations ran
    pub struct MockDeployer {
        pub plan: Plan,
        pub outputs: Vec<StackOutput>,
        pub exists: bool,
        pub authenticated: bool,
        pub calls: Mutex<Vec<&'static str>>,
    }

    impl MockDeployer {
        pub fn new(plan: Plan) -> Self {
            Self {
                plan,
                outputs: vec![StackOutput {
                    key: "ElasticIPOutput".to_string(),
                    value: "203.0.113.10".to_string(),
                    description: Some("Elastic IP of the proxy server".to_string()),
                    export_name: Some("ProxyElasticIP".to_string()),
                }],
                exists: true,
                authenticated: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn missing() -> Self {
            Self {
                exists: false,
                ..Self::new(Plan::empty())
            }
        }

        pub fn unauthenticated() -> Self {
            Self {
                authenticated: false,
                ..Self::new(Plan::empty())
            }
        }

        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl StackDeployer for MockDeployer {
        fn name(&self) -> &str {
            "mock"
        }

        fn stack_name(&self) -> &str {
            "TestStack"
        }

        async fn check_auth(&self) -> proxystack_cloud::Result<AuthStatus> {
            self.record("check_auth");
            if self.authenticated {
                Ok(AuthStatus::ok("mock"))
            } else {
                Ok(AuthStatus::failed("expired token"))
            }
        }

        async fn plan(&self, _template: &Template) -> proxystack_cloud::Result<Plan> {
            self.record("plan");
            Ok(self.plan.clone())
        }

        async fn deploy(&self, _template: &Template) -> proxystack_cloud::Result<DeployResult> {
            self.record("deploy");
            Ok(DeployResult {
                stack_id: Some("arn:aws:cloudformation:us-east-1:123456789012:stack/TestStack/1".to_string()),
                status: "CREATE_COMPLETE".to_string(),
                plan: self.plan.clone(),
                outputs: self.outputs.clone(),
                duration_ms: 1,
            })
        }

        async fn outputs(&self) -> proxystack_cloud::Result<Vec<StackOutput>> {
            self.record("outputs");
            if self.exists {
                Ok(self.outputs.clone())
            } else {
                Err(CloudError::StackNotFound("TestStack".to_string()))
            }
        }

        async fn destroy(&self) -> proxystack_cloud::Result<()> {
            self.record("destroy");
            if self.exists {
                Ok(())
            } else {
                Err(CloudError::StackNotFound("TestStack".to_string()))
            }
        }
    }

    pub fn sample_plan() -> Plan {
        Plan::new(vec![proxystack_cloud::Action {
            logical_id: "ProxyEC2Instance".to_string(),
            action_type: proxystack_cloud::ActionType::Create,
            resource_type: "AWS::EC2::Instance".to_string(),
            replacement: false,
        }])
    }
}
