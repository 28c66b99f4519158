use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{Permission, Role};
use crate::models::rule::{ResourceAction, ResourceKind};

/// What happened, from the audit trail's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditAction {
    PermissionCheck {
        permission: Permission,
    },
    ResourceAccess {
        resource_kind: ResourceKind,
        resource_id: Uuid,
        action: ResourceAction,
    },
    RoleChanged {
        from: Role,
        to: Role,
    },
    PermissionsGranted {
        permissions: Vec<Permission>,
    },
    PermissionsRevoked {
        permissions: Vec<Permission>,
    },
    TemplateApplied {
        template: String,
    },
}

/// Append-only audit record. One entry per affected user per decision or
/// mutation; never updated or deleted by normal flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionAuditEntry {
    pub id: Uuid,
    /// The user the decision or mutation was about.
    pub user_id: Uuid,
    /// The principal that initiated it.
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub result: bool,
    pub context: Value,
    pub timestamp: DateTime<Utc>,
}

impl PermissionAuditEntry {
    pub fn new(user_id: Uuid, actor_id: Uuid, action: AuditAction, result: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            actor_id,
            action,
            result,
            context: Value::Null,
            timestamp: Utc::now(),
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// Filter for audit reads. Entries come back in append order; callers that
/// need chronological order sort on `timestamp` themselves.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}
