//! The Tinyproxy stack declaration
//!
//! [`declare`] is a pure function from inputs to template: no I/O, no
//! clocks, no provider calls. Provider-assigned values (instance id, the
//! Elastic IP itself) appear only as `Ref`/`Fn::GetAtt` expressions.

use crate::error::Result;
use crate::policy::{self, PolicyDocument, Statement};
use crate::template::{Output, Resource, Template, base64, get_att, reference};
use crate::user_data::UserData;
use proxystack_config::StackInputs;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

pub const DEFAULT_STACK_NAME: &str = "AwsProxyServerStack";

pub const PROXY_PORT: u16 = 8888;
pub const SSH_PORT: u16 = 22;
pub const ANY_IPV4: &str = "0.0.0.0/0";

pub const PARAMETER_NAMESPACE: &str = "/tinyproxy";
pub const USERNAME_PARAMETER: &str = "/tinyproxy/username";
pub const PASSWORD_PARAMETER: &str = "/tinyproxy/password";
pub const IP_LIST_PARAMETER: &str = "/tinyproxy/ip_list";
pub const PARAMETER_READ_ACTION: &str = "ssm:GetParameter";

pub const KEY_PAIR_NAME: &str = "ec2-key-pair";

/// Logical ids, stable across deployments
pub mod logical_id {
    pub const USERNAME_PARAMETER: &str = "TinyproxyUsernameParameter";
    pub const PASSWORD_PARAMETER: &str = "TinyproxyPasswordParameter";
    pub const IP_LIST_PARAMETER: &str = "TinyproxyIpListParameter";
    pub const INSTANCE_ROLE: &str = "ProxyEC2InstanceRole";
    pub const INSTANCE_PROFILE: &str = "ProxyEC2InstanceProfile";
    pub const SECURITY_GROUP: &str = "ProxyEC2SecurityGroup";
    pub const KEY_PAIR: &str = "ProxyKeyPair";
    pub const INSTANCE: &str = "ProxyEC2Instance";
    pub const ELASTIC_IP: &str = "ProxyElasticIP";
    pub const ELASTIC_IP_ASSOCIATION: &str = "ProxyElasticIPAssociation";

    pub const USERNAME_OUTPUT: &str = "TinyproxyUsernameOutput";
    pub const PASSWORD_OUTPUT: &str = "TinyproxyPasswordOutput";
    pub const ELASTIC_IP_OUTPUT: &str = "ElasticIPOutput";
}

/// Where the security group and instance are placed
///
/// Without one, both land in the account's default VPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkContext {
    pub vpc_id: String,
    pub subnet_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeclareOptions {
    pub stack_name: String,
    pub network: Option<NetworkContext>,
    pub user_data: UserData,
}

impl DeclareOptions {
    pub fn new(user_data: UserData) -> Self {
        Self {
            stack_name: DEFAULT_STACK_NAME.to_string(),
            network: None,
            user_data,
        }
    }

    pub fn with_stack_name(mut self, stack_name: impl Into<String>) -> Self {
        self.stack_name = stack_name.into();
        self
    }

    pub fn with_network(mut self, network: Option<NetworkContext>) -> Self {
        self.network = network;
        self
    }
}

/// One security group rule in CloudFormation's inline form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupRule {
    pub ip_protocol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_port: Option<u16>,

    pub cidr_ip: String,

    pub description: String,
}

impl SecurityGroupRule {
    pub fn tcp_from_any(port: u16, description: &str) -> Self {
        Self {
            ip_protocol: "tcp".to_string(),
            from_port: Some(port),
            to_port: Some(port),
            cidr_ip: ANY_IPV4.to_string(),
            description: description.to_string(),
        }
    }

    pub fn all_outbound() -> Self {
        Self {
            ip_protocol: "-1".to_string(),
            from_port: None,
            to_port: None,
            cidr_ip: ANY_IPV4.to_string(),
            description: "Allow all outbound traffic by default".to_string(),
        }
    }
}

/// SSM parameter resource pattern granted to the instance role
pub fn parameter_policy_resource(inputs: &StackInputs) -> String {
    format!(
        "arn:aws:ssm:{}:{}:parameter{}/*",
        inputs.region, inputs.account_id, PARAMETER_NAMESPACE
    )
}

/// Declare the full proxy stack
pub fn declare(inputs: &StackInputs, options: &DeclareOptions) -> Result<Template> {
    let mut template = Template::new(Some(format!(
        "{}: Tinyproxy forward proxy on a single EC2 instance",
        options.stack_name
    )));

    declare_parameters(&mut template, inputs);
    declare_instance_role(&mut template, inputs)?;
    declare_security_group(&mut template, options.network.as_ref());
    declare_instance(&mut template, inputs, options);
    declare_elastic_ip(&mut template);
    declare_outputs(&mut template, inputs);

    debug!(
        stack = %options.stack_name,
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        "Declared stack"
    );

    Ok(template)
}

fn declare_parameters(template: &mut Template, inputs: &StackInputs) {
    let entries = [
        (
            logical_id::USERNAME_PARAMETER,
            USERNAME_PARAMETER,
            inputs.proxy_username.as_str(),
            "Tinyproxy username for authentication",
        ),
        (
            logical_id::PASSWORD_PARAMETER,
            PASSWORD_PARAMETER,
            inputs.proxy_password.as_str(),
            "Tinyproxy password for authentication",
        ),
        (
            logical_id::IP_LIST_PARAMETER,
            IP_LIST_PARAMETER,
            inputs.ip_list.as_str(),
            "Tinyproxy IP List for access",
        ),
    ];

    for (id, name, value, description) in entries {
        template.add_resource(
            id,
            Resource::new(
                "AWS::SSM::Parameter",
                json!({
                    "Name": name,
                    "Type": "String",
                    "Value": value,
                    "Description": description,
                }),
            ),
        );
    }
}

fn declare_instance_role(template: &mut Template, inputs: &StackInputs) -> Result<()> {
    let resource = parameter_policy_resource(inputs);
    policy::verify_parameter_scope(
        &resource,
        &inputs.region,
        &inputs.account_id,
        PARAMETER_NAMESPACE,
        &[USERNAME_PARAMETER, PASSWORD_PARAMETER, IP_LIST_PARAMETER],
    )?;

    let trust = PolicyDocument::new(vec![Statement::assume_role_by("ec2.amazonaws.com")]);
    let access = PolicyDocument::new(vec![Statement::allow(
        &[PARAMETER_READ_ACTION],
        vec![resource],
    )]);

    template.add_resource(
        logical_id::INSTANCE_ROLE,
        Resource::new(
            "AWS::IAM::Role",
            json!({
                "AssumeRolePolicyDocument": trust,
                "Policies": [{
                    "PolicyName": "SSMAccessPolicy",
                    "PolicyDocument": access,
                }],
            }),
        ),
    );

    template.add_resource(
        logical_id::INSTANCE_PROFILE,
        Resource::new(
            "AWS::IAM::InstanceProfile",
            json!({ "Roles": [reference(logical_id::INSTANCE_ROLE)] }),
        ),
    );

    Ok(())
}

fn declare_security_group(template: &mut Template, network: Option<&NetworkContext>) {
    let ingress = vec![
        SecurityGroupRule::tcp_from_any(PROXY_PORT, "Allow proxy traffic"),
        SecurityGroupRule::tcp_from_any(SSH_PORT, "Allow SSH access"),
    ];
    let egress = vec![SecurityGroupRule::all_outbound()];

    let mut properties = json!({
        "GroupDescription": "Allow traffic for Tinyproxy and SSH",
        "SecurityGroupIngress": ingress,
        "SecurityGroupEgress": egress,
    });
    if let Some(network) = network {
        properties["VpcId"] = json!(network.vpc_id);
    }

    template.add_resource(
        logical_id::SECURITY_GROUP,
        Resource::new("AWS::EC2::SecurityGroup", properties),
    );
}

fn declare_instance(template: &mut Template, inputs: &StackInputs, options: &DeclareOptions) {
    template.add_resource(
        logical_id::KEY_PAIR,
        Resource::new("AWS::EC2::KeyPair", json!({ "KeyName": KEY_PAIR_NAME })),
    );

    let mut properties = json!({
        "ImageId": inputs.image_id,
        "InstanceType": inputs.instance_type,
        "IamInstanceProfile": reference(logical_id::INSTANCE_PROFILE),
        "SecurityGroupIds": [get_att(logical_id::SECURITY_GROUP, "GroupId")],
        "KeyName": reference(logical_id::KEY_PAIR),
        "UserData": base64(options.user_data.as_str()),
        "Tags": [{
            "Key": "Name",
            "Value": format!("{}/{}", options.stack_name, logical_id::INSTANCE),
        }],
    });
    if let Some(subnet_id) = options.network.as_ref().and_then(|n| n.subnet_id.as_ref()) {
        properties["SubnetId"] = json!(subnet_id);
    }

    template.add_resource(
        logical_id::INSTANCE,
        Resource::new("AWS::EC2::Instance", properties).depends_on(logical_id::INSTANCE_ROLE),
    );
}

fn declare_elastic_ip(template: &mut Template) {
    template.add_resource(
        logical_id::ELASTIC_IP,
        Resource::new("AWS::EC2::EIP", json!({ "Domain": "vpc" })),
    );

    template.add_resource(
        logical_id::ELASTIC_IP_ASSOCIATION,
        Resource::new(
            "AWS::EC2::EIPAssociation",
            json!({
                "AllocationId": get_att(logical_id::ELASTIC_IP, "AllocationId"),
                "InstanceId": reference(logical_id::INSTANCE),
            }),
        ),
    );
}

fn declare_outputs(template: &mut Template, inputs: &StackInputs) {
    template.add_output(
        logical_id::USERNAME_OUTPUT,
        Output::new(
            json!(inputs.proxy_username),
            "Tinyproxy username for authentication",
        )
        .exported_as("TinyproxyUsername"),
    );

    template.add_output(
        logical_id::PASSWORD_OUTPUT,
        Output::new(
            json!(inputs.proxy_password),
            "Tinyproxy password for authentication",
        )
        .exported_as("TinyproxyPassword"),
    );

    template.add_output(
        logical_id::ELASTIC_IP_OUTPUT,
        Output::new(
            reference(logical_id::ELASTIC_IP),
            "Elastic IP of the proxy server",
        )
        .exported_as("ProxyElasticIP"),
    );
}
