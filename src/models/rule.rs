use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::User;

/// Resource kinds the engine can authorize against. Anything outside this
/// closed set denies by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Company,
    User,
    Journal,
    MoodEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    Read,
    Create,
    Update,
    Delete,
    Manage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleEffect {
    Allow,
    Deny,
}

/// Condition tree evaluated against the attribute bag of a
/// [`PermissionContext`]. Missing attributes never match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleCondition {
    Always,
    AttributeEquals { key: String, value: Value },
    AttributeIn { key: String, values: Vec<Value> },
    All { conditions: Vec<RuleCondition> },
    Any { conditions: Vec<RuleCondition> },
}

/// Dynamically stored ABAC rule. Created, updated and deleted only by users
/// holding `manage_platform`; persisted independently of user records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRule {
    pub id: Uuid,
    pub resource_kind: ResourceKind,
    pub action: ResourceAction,
    pub condition: RuleCondition,
    pub effect: RuleEffect,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PermissionRule {
    /// A rule only participates in decisions targeting its own resource kind
    /// and action.
    pub fn matches_target(&self, kind: ResourceKind, action: ResourceAction) -> bool {
        self.resource_kind == kind && self.action == action
    }
}

/// Everything a rule may look at when deciding: the acting user, the target
/// resource, and an arbitrary attribute bag supplied by the caller.
#[derive(Debug, Clone)]
pub struct PermissionContext {
    pub actor: User,
    pub resource_kind: ResourceKind,
    pub resource_id: Option<Uuid>,
    pub action: ResourceAction,
    pub attributes: serde_json::Map<String, Value>,
}

impl PermissionContext {
    pub fn new(actor: User, resource_kind: ResourceKind, action: ResourceAction) -> Self {
        Self {
            actor,
            resource_kind,
            resource_id: None,
            action,
            attributes: serde_json::Map::new(),
        }
    }

    pub fn with_resource_id(mut self, id: Uuid) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}
