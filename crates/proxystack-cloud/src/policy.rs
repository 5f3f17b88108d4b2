//! IAM policy documents and resource pattern checks

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<Statement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub effect: Effect,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,

    pub action: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<String>,
}

impl Statement {
    pub fn allow(actions: &[&str], resources: Vec<String>) -> Self {
        Self {
            effect: Effect::Allow,
            principal: None,
            action: actions.iter().map(|a| a.to_string()).collect(),
            resource: resources,
        }
    }

    /// Trust statement letting an AWS service assume a role
    pub fn assume_role_by(service: &str) -> Self {
        Self {
            effect: Effect::Allow,
            principal: Some(Principal {
                service: service.to_string(),
            }),
            action: vec!["sts:AssumeRole".to_string()],
            resource: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    pub service: String,
}

/// ARN of an SSM parameter; `name` carries its leading slash
pub fn parameter_arn(region: &str, account_id: &str, name: &str) -> String {
    format!(
        "arn:aws:ssm:{}:{}:parameter/{}",
        region,
        account_id,
        name.trim_start_matches('/')
    )
}

/// IAM-style wildcard match: `*` spans any run of characters, `?` exactly one
pub fn arn_matches(pattern: &str, arn: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = arn.chars().collect();

    let (mut pi, mut si) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while si < s.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == s[si]) {
            pi += 1;
            si += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = si;
            pi += 1;
        } else if let Some(star_pos) = star {
            pi = star_pos + 1;
            mark += 1;
            si = mark;
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

/// Check that `pattern` covers every parameter in `names` and cannot reach
/// anything outside `namespace`
///
/// The literal prefix of the pattern (everything before its first wildcard)
/// must be the namespace's own ARN prefix, so no ARN outside the namespace
/// can ever match.
pub fn verify_parameter_scope(
    pattern: &str,
    region: &str,
    account_id: &str,
    namespace: &str,
    names: &[&str],
) -> Result<()> {
    let namespace_prefix = format!(
        "{}/",
        parameter_arn(region, account_id, namespace).trim_end_matches('/')
    );

    let literal_end = pattern.find(['*', '?']).unwrap_or(pattern.len());
    if !pattern[..literal_end].starts_with(&namespace_prefix) {
        return Err(CloudError::PolicyScope(format!(
            "pattern {} reaches outside {}",
            pattern, namespace_prefix
        )));
    }

    for name in names {
        let arn = parameter_arn(region, account_id, name);
        if !arn_matches(pattern, &arn) {
            return Err(CloudError::PolicyScope(format!(
                "pattern {} does not cover {}",
                pattern, arn
            )));
        }
    }

    Ok(())
}
