// Pure permission decision logic - no I/O, no errors, booleans only.
//
// Every function here is total over well-formed input. Enforcement (typed
// denials) lives in the guard; orchestration against stores lives in the
// service layer.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::catalog::{role_permissions, Permission, Role};
use crate::models::rule::{PermissionContext, PermissionRule, RuleCondition, RuleEffect};
use crate::models::User;

/// True iff the permission is in the user's role defaults or direct grants.
pub fn has_permission(user: &User, permission: Permission) -> bool {
    role_permissions(user.role).contains(&permission) || user.permissions.contains(&permission)
}

pub fn has_any_permission(user: &User, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| has_permission(user, *p))
}

pub fn has_all_permissions(user: &User, permissions: &[Permission]) -> bool {
    permissions.iter().all(|p| has_permission(user, *p))
}

/// De-duplicated union of role defaults and direct grants.
pub fn effective_permissions(user: &User) -> BTreeSet<Permission> {
    let mut set = role_permissions(user.role).clone();
    set.extend(user.permissions.iter().copied());
    set
}

/// Where an effective permission came from. Transparency view only; decisions
/// always go through [`has_permission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PermissionSource {
    Role { role: Role },
    Direct,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritedPermission {
    pub permission: Permission,
    pub source: PermissionSource,
}

/// Effective permissions annotated with their source. A permission granted
/// both by role and directly reports the role as its source.
pub fn inherited_permissions(user: &User) -> Vec<InheritedPermission> {
    let defaults = role_permissions(user.role);
    let mut listed: Vec<InheritedPermission> = defaults
        .iter()
        .map(|p| InheritedPermission {
            permission: *p,
            source: PermissionSource::Role { role: user.role },
        })
        .collect();
    listed.extend(
        user.permissions
            .iter()
            .filter(|p| !defaults.contains(p))
            .map(|p| InheritedPermission {
                permission: *p,
                source: PermissionSource::Direct,
            }),
    );
    listed
}

/// The sole tenant-isolation boundary: super admins cross companies, everyone
/// else is confined to their own `company_id`.
pub fn can_access_company(user: &User, company_id: Uuid) -> bool {
    user.role == Role::SuperAdmin || user.company_id == Some(company_id)
}

/// Whether `manager` may manage `target` (role changes, grants, deactivation).
///
/// Super admins manage anyone. Company admins and managers only manage
/// strictly lower-ranked users inside their own company - never a peer or a
/// superior, never across tenants. Self-management of profile data is a
/// separate path gated on `manage_profile`, not this check.
pub fn can_manage_user(manager: &User, target: &User) -> bool {
    if manager.role == Role::SuperAdmin {
        return true;
    }
    if !matches!(manager.role, Role::CompanyAdmin | Role::CompanyManager) {
        return false;
    }
    manager.company_id.is_some()
        && manager.company_id == target.company_id
        && manager.role.rank() > target.role.rank()
}

/// Whether `viewer` may read `target`'s journals, moods and insights.
pub fn can_view_user_data(viewer: &User, target: &User) -> bool {
    if viewer.id == target.id || viewer.role == Role::SuperAdmin {
        return true;
    }
    viewer.company_id.is_some()
        && viewer.company_id == target.company_id
        && has_permission(viewer, Permission::ViewCompanyData)
}

/// The single escalation choke point: an assigner may only hand out roles
/// strictly below their own rank, and company roles only inside their own
/// company. Every role mutation routes through this.
pub fn can_assign_role(assigner: &User, new_role: Role, company_id: Option<Uuid>) -> bool {
    if assigner.role.rank() <= new_role.rank() {
        return false;
    }
    if new_role.is_company_role() && assigner.role != Role::SuperAdmin {
        return assigner.company_id.is_some() && assigner.company_id == company_id;
    }
    true
}

/// Outcome of evaluating one ABAC rule. `NotApplicable` is distinct from
/// `Deny`: absence of a matching rule falls back to role/permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Allow,
    Deny,
    NotApplicable,
}

/// Evaluates a stored rule against a context. Returns the rule's effect when
/// the target matches and the condition holds, otherwise `NotApplicable`.
pub fn evaluate_rule(rule: &PermissionRule, ctx: &PermissionContext) -> RuleOutcome {
    if !rule.matches_target(ctx.resource_kind, ctx.action) {
        return RuleOutcome::NotApplicable;
    }
    if !condition_holds(&rule.condition, ctx) {
        return RuleOutcome::NotApplicable;
    }
    match rule.effect {
        RuleEffect::Allow => RuleOutcome::Allow,
        RuleEffect::Deny => RuleOutcome::Deny,
    }
}

fn condition_holds(condition: &RuleCondition, ctx: &PermissionContext) -> bool {
    match condition {
        RuleCondition::Always => true,
        RuleCondition::AttributeEquals { key, value } => {
            context_attribute(ctx, key).map_or(false, |found| found == *value)
        }
        RuleCondition::AttributeIn { key, values } => {
            context_attribute(ctx, key).map_or(false, |found| values.contains(&found))
        }
        RuleCondition::All { conditions } => conditions.iter().all(|c| condition_holds(c, ctx)),
        RuleCondition::Any { conditions } => conditions.iter().any(|c| condition_holds(c, ctx)),
    }
}

/// Attribute lookup with a few well-known actor keys resolved from the
/// context itself, so rules can reference the principal without the caller
/// copying fields into the bag.
fn context_attribute(ctx: &PermissionContext, key: &str) -> Option<Value> {
    match key {
        "actor.id" => Some(Value::String(ctx.actor.id.to_string())),
        "actor.role" => serde_json::to_value(ctx.actor.role).ok(),
        "actor.company_id" => Some(
            ctx.actor
                .company_id
                .map_or(Value::Null, |id| Value::String(id.to_string())),
        ),
        "resource.id" => ctx.resource_id.map(|id| Value::String(id.to_string())),
        _ => ctx.attributes.get(key).cloned(),
    }
}
