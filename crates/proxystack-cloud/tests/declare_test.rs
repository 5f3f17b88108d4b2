use proxystack_cloud::policy::{arn_matches, parameter_arn};
use proxystack_cloud::stack::{SecurityGroupRule, logical_id};
use proxystack_cloud::{DeclareOptions, Template, UserData, UserDataMode, declare};
use proxystack_config::StackInputs;
use serde_json::{Value, json};
use std::collections::HashMap;

const USER_DATA: &str = "#!/bin/bash\nset -e\napt-get install -y tinyproxy\n";

/// Reference input set used across these tests
fn example_inputs() -> StackInputs {
    let vars = HashMap::from([
        ("ACCOUNT_ID", "123456789012"),
        ("REGION", "us-east-1"),
        ("TINYPROXY_USERNAME", "proxyuser"),
        ("TINYPROXY_PASSWORD", "s3cr3t"),
        ("EC2_INSTANCE_AMI", "ami-0abcd1234"),
        ("IP_LIST", "1.2.3.4,5.6.7.8"),
        ("INSTANCE_TYPE", "t3.micro"),
    ]);
    StackInputs::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn declare_example() -> Template {
    let options = DeclareOptions::new(UserData::from_text(USER_DATA));
    declare(&example_inputs(), &options).unwrap()
}

fn count(template: &Template, resource_type: &str) -> usize {
    template.resources_of_type(resource_type).count()
}

#[test]
fn test_resource_counts() {
    let template = declare_example();

    assert_eq!(count(&template, "AWS::EC2::Instance"), 1);
    assert_eq!(count(&template, "AWS::EC2::EIP"), 1);
    assert_eq!(count(&template, "AWS::EC2::EIPAssociation"), 1);
    assert_eq!(count(&template, "AWS::EC2::SecurityGroup"), 1);
    assert_eq!(count(&template, "AWS::SSM::Parameter"), 3);
    assert_eq!(count(&template, "AWS::IAM::Role"), 1);
    assert_eq!(count(&template, "AWS::IAM::InstanceProfile"), 1);
    assert_eq!(count(&template, "AWS::EC2::KeyPair"), 1);
    assert_eq!(template.resources.len(), 10);
}

#[test]
fn test_instance_properties() {
    let template = declare_example();
    let instance = template.resource(logical_id::INSTANCE).unwrap();

    assert_eq!(
        instance.property_as::<String>("InstanceType").as_deref(),
        Some("t3.micro")
    );
    assert_eq!(
        instance.property_as::<String>("ImageId").as_deref(),
        Some("ami-0abcd1234")
    );
    assert_eq!(
        instance.property("SecurityGroupIds"),
        Some(&json!([{ "Fn::GetAtt": ["ProxyEC2SecurityGroup", "GroupId"] }]))
    );
}

#[test]
fn test_boot_script_passed_unchanged() {
    let template = declare_example();
    let instance = template.resource(logical_id::INSTANCE).unwrap();

    assert_eq!(
        instance.property("UserData"),
        Some(&json!({ "Fn::Base64": USER_DATA }))
    );
}

#[test]
fn test_boot_script_loaded_from_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("user_data.sh");
    std::fs::write(&path, USER_DATA).unwrap();

    let inputs = example_inputs();
    let user_data = UserData::load(&path, UserDataMode::Literal, &inputs.ip_list).unwrap();
    let template = declare(&inputs, &DeclareOptions::new(user_data)).unwrap();

    assert_eq!(template, declare_example());
}

#[test]
fn test_elastic_ip_bound_to_instance() {
    let template = declare_example();

    let eip = template.resource(logical_id::ELASTIC_IP).unwrap();
    assert_eq!(eip.property_as::<String>("Domain").as_deref(), Some("vpc"));

    let association = template
        .resource(logical_id::ELASTIC_IP_ASSOCIATION)
        .unwrap();
    assert_eq!(
        association.property("InstanceId"),
        Some(&json!({ "Ref": "ProxyEC2Instance" }))
    );
    assert_eq!(
        association.property("AllocationId"),
        Some(&json!({ "Fn::GetAtt": ["ProxyElasticIP", "AllocationId"] }))
    );
}

#[test]
fn test_security_group_rules() {
    let template = declare_example();
    let sg = template.resource(logical_id::SECURITY_GROUP).unwrap();

    let ingress: Vec<SecurityGroupRule> = sg.property_as("SecurityGroupIngress").unwrap();
    assert_eq!(ingress.len(), 2);
    let ports: Vec<Option<u16>> = ingress.iter().map(|r| r.from_port).collect();
    assert_eq!(ports, vec![Some(8888), Some(22)]);
    for rule in &ingress {
        assert_eq!(rule.ip_protocol, "tcp");
        assert_eq!(rule.cidr_ip, "0.0.0.0/0");
        assert_eq!(rule.from_port, rule.to_port);
    }

    let egress: Vec<SecurityGroupRule> = sg.property_as("SecurityGroupEgress").unwrap();
    assert_eq!(egress, vec![SecurityGroupRule::all_outbound()]);
    assert_eq!(egress[0].ip_protocol, "-1");
}

#[test]
fn test_parameters_hold_inputs() {
    let template = declare_example();

    let mut entries: Vec<(String, String)> = template
        .resources_of_type("AWS::SSM::Parameter")
        .map(|(_, r)| {
            (
                r.property_as::<String>("Name").unwrap(),
                r.property_as::<String>("Value").unwrap(),
            )
        })
        .collect();
    entries.sort();

    assert_eq!(
        entries,
        vec![
            ("/tinyproxy/ip_list".to_string(), "1.2.3.4,5.6.7.8".to_string()),
            ("/tinyproxy/password".to_string(), "s3cr3t".to_string()),
            ("/tinyproxy/username".to_string(), "proxyuser".to_string()),
        ]
    );
}

#[test]
fn test_access_policy_is_read_only_and_scoped() {
    let template = declare_example();
    let role = template.resource(logical_id::INSTANCE_ROLE).unwrap();

    let policies = role.property("Policies").unwrap().as_array().unwrap();
    assert_eq!(policies.len(), 1);
    let statements = policies[0]["PolicyDocument"]["Statement"].as_array().unwrap();
    assert_eq!(statements.len(), 1);

    let statement = &statements[0];
    assert_eq!(statement["Effect"], "Allow");
    assert_eq!(statement["Action"], json!(["ssm:GetParameter"]));

    let resources: Vec<&str> = statement["Resource"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(resources.len(), 1);
    let pattern = resources[0];

    for (_, parameter) in template.resources_of_type("AWS::SSM::Parameter") {
        let name = parameter.property_as::<String>("Name").unwrap();
        let arn = parameter_arn("us-east-1", "123456789012", &name);
        assert!(arn_matches(pattern, &arn), "{arn} not covered");
    }

    for outside in [
        "arn:aws:ssm:us-east-1:123456789012:parameter/other/secret",
        "arn:aws:ssm:us-east-1:123456789012:parameter/tinyproxy-admin/password",
        "arn:aws:ssm:us-east-1:999999999999:parameter/tinyproxy/username",
        "arn:aws:ssm:eu-west-1:123456789012:parameter/tinyproxy/username",
    ] {
        assert!(!arn_matches(pattern, outside), "{outside} must not match");
    }
}

#[test]
fn test_role_trusts_ec2() {
    let template = declare_example();
    let role = template.resource(logical_id::INSTANCE_ROLE).unwrap();

    assert_eq!(
        role.property("AssumeRolePolicyDocument").unwrap()["Statement"][0]["Principal"]["Service"],
        "ec2.amazonaws.com"
    );

    let profile = template.resource(logical_id::INSTANCE_PROFILE).unwrap();
    assert_eq!(
        profile.property("Roles"),
        Some(&json!([{ "Ref": "ProxyEC2InstanceRole" }]))
    );
}

#[test]
fn test_outputs() {
    let template = declare_example();
    assert_eq!(template.outputs.len(), 3);

    let username = template.output(logical_id::USERNAME_OUTPUT).unwrap();
    assert_eq!(username.value, json!("proxyuser"));
    assert_eq!(username.export.as_ref().unwrap().name, "TinyproxyUsername");

    let password = template.output(logical_id::PASSWORD_OUTPUT).unwrap();
    assert_eq!(password.value, json!("s3cr3t"));
    assert_eq!(password.export.as_ref().unwrap().name, "TinyproxyPassword");

    let address = template.output(logical_id::ELASTIC_IP_OUTPUT).unwrap();
    assert_eq!(address.value, json!({ "Ref": "ProxyElasticIP" }));
    assert_eq!(address.export.as_ref().unwrap().name, "ProxyElasticIP");
}

#[test]
fn test_declaration_is_deterministic() {
    let first = declare_example().to_json_pretty().unwrap();
    let second = declare_example().to_json_pretty().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_template_round_trips_through_json() {
    let template = declare_example();
    let parsed = Template::from_json(&template.to_json_pretty().unwrap()).unwrap();
    assert_eq!(parsed, template);
}
