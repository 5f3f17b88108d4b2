//! Planned changes reported by the provisioning engine
//!
//! These types only describe what the engine intends to do; the engine
//! computes them.

use serde::{Deserialize, Serialize};

/// A single planned change to one logical resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Logical id in the template
    pub logical_id: String,

    /// Type of action the engine will perform
    pub action_type: ActionType,

    /// CloudFormation resource type (e.g., "AWS::EC2::Instance")
    pub resource_type: String,

    /// Whether an update replaces the physical resource
    pub replacement: bool,
}

impl Action {
    pub fn description(&self) -> String {
        let mut text = format!(
            "{} {} ({})",
            self.action_type, self.logical_id, self.resource_type
        );
        if self.replacement {
            text.push_str(" [replacement]");
        }
        text
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// All actions of one change set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            replace: self.actions.iter().filter(|a| a.replacement).count(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub replace: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update ({} replaced), {} to delete",
            self.create, self.update, self.replace, self.delete
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(logical_id: &str, action_type: ActionType, replacement: bool) -> Action {
        Action {
            logical_id: logical_id.to_string(),
            action_type,
            resource_type: "AWS::EC2::Instance".to_string(),
            replacement,
        }
    }

    #[test]
    fn test_plan_summary() {
        let plan = Plan::new(vec![
            action("ProxyEC2Instance", ActionType::Update, true),
            action("ProxyElasticIP", ActionType::Create, false),
            action("OldThing", ActionType::Delete, false),
        ]);

        assert!(plan.has_changes);
        assert_eq!(
            plan.summary(),
            PlanSummary {
                create: 1,
                update: 1,
                delete: 1,
                replace: 1
            }
        );
        assert_eq!(
            plan.summary().to_string(),
            "1 to create, 1 to update (1 replaced), 1 to delete"
        );
    }

    #[test]
    fn test_empty_plan() {
        assert!(!Plan::empty().has_changes);
        assert!(!Plan::new(vec![action("X", ActionType::NoOp, false)]).has_changes);
    }

    #[test]
    fn test_description() {
        let a = action("ProxyEC2Instance", ActionType::Update, true);
        assert_eq!(
            a.description(),
            "update ProxyEC2Instance (AWS::EC2::Instance) [replacement]"
        );
    }
}
