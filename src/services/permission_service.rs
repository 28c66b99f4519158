// Permission orchestration over injected store collaborators.
//
// Every mutation re-validates authorization through the domain logic before
// touching the store, then writes an audit entry. Audit writes are
// best-effort: a failed write is logged and counted, never surfaced as a
// failure of the authorized operation.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{Permission, Role};
use crate::config::EngineConfig;
use crate::domain::{self, RuleOutcome};
use crate::error::AccessError;
use crate::guard;
use crate::models::{
    AuditAction, AuditQuery, PermissionAuditEntry, PermissionContext, PermissionRule,
    PermissionTemplate, ResourceAction, ResourceKind, RuleCondition, RuleEffect, User,
};
use crate::store::{
    AuditStore, ResourceDirectory, RuleStore, StoreError, TemplateStore, UserPatch, UserStore,
};

/// Result of a bulk operation under the best-effort-continue policy: members
/// that failed authorization or lookup are reported, never silently dropped.
#[derive(Debug, Clone)]
pub struct BulkOutcome {
    pub applied: Vec<Uuid>,
    pub skipped: Vec<BulkSkip>,
}

#[derive(Debug, Clone)]
pub struct BulkSkip {
    pub user_id: Uuid,
    pub code: &'static str,
    pub message: String,
}

pub struct PermissionService {
    users: Arc<dyn UserStore>,
    audit: Arc<dyn AuditStore>,
    rules: Arc<dyn RuleStore>,
    templates: Arc<dyn TemplateStore>,
    resources: Arc<dyn ResourceDirectory>,
    config: EngineConfig,
    audit_failures: AtomicU64,
}

impl PermissionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        audit: Arc<dyn AuditStore>,
        rules: Arc<dyn RuleStore>,
        templates: Arc<dyn TemplateStore>,
        resources: Arc<dyn ResourceDirectory>,
        config: EngineConfig,
    ) -> Self {
        Self {
            users,
            audit,
            rules,
            templates,
            resources,
            config,
            audit_failures: AtomicU64::new(0),
        }
    }

    /// Number of audit writes that failed since construction. A non-zero
    /// value means the audit pipeline is degraded and operators should look
    /// at the logs; the underlying operations still completed.
    pub fn audit_degraded_count(&self) -> u64 {
        self.audit_failures.load(Ordering::Relaxed)
    }

    async fn record_audit(&self, entry: PermissionAuditEntry) {
        if let Err(err) = self.audit.append(entry).await {
            self.audit_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("audit write failed, pipeline degraded: {}", err);
        }
    }

    /// Read-only permission check, audited when configured. Audit failure
    /// never changes the decision.
    pub async fn check_permission(&self, user: &User, permission: Permission) -> bool {
        let allowed = domain::has_permission(user, permission);
        if self.config.audit_read_checks {
            self.record_audit(PermissionAuditEntry::new(
                user.id,
                user.id,
                AuditAction::PermissionCheck { permission },
                allowed,
            ))
            .await;
        }
        allowed
    }

    /// Resource-based authorization. Dispatches per resource kind; missing
    /// or unresolvable targets deny. Store outages surface as errors rather
    /// than denials.
    pub async fn can_access_resource(
        &self,
        user: &User,
        kind: ResourceKind,
        resource_id: Uuid,
        action: ResourceAction,
    ) -> Result<bool, AccessError> {
        let allowed = match kind {
            ResourceKind::Company => {
                domain::can_access_company(user, resource_id)
                    && (action == ResourceAction::Read
                        || domain::has_any_permission(
                            user,
                            &[Permission::ManageCompany, Permission::ManageCompanies],
                        ))
            }
            ResourceKind::User => match self.users.get_user(resource_id).await {
                Ok(target) => user_action_allowed(user, &target, action),
                Err(StoreError::NotFound(_)) => false,
                Err(err) => return Err(err.into()),
            },
            ResourceKind::Journal | ResourceKind::MoodEntry => {
                match self.resources.resource_owner(kind, resource_id).await? {
                    Some(owner) => {
                        if user.id == owner.owner_id || user.role == Role::SuperAdmin {
                            true
                        } else if action == ResourceAction::Read
                            && matches!(user.role, Role::CompanyAdmin | Role::CompanyManager)
                            && user.company_id.is_some()
                            && user.company_id == owner.company_id
                            && domain::has_permission(user, Permission::ViewCompanyData)
                        {
                            true
                        } else {
                            // Personal wellness data: nobody else, for any
                            // action
                            false
                        }
                    }
                    None => false,
                }
            }
        };

        if self.config.audit_read_checks {
            self.record_audit(PermissionAuditEntry::new(
                user.id,
                user.id,
                AuditAction::ResourceAccess {
                    resource_kind: kind,
                    resource_id,
                    action,
                },
                allowed,
            ))
            .await;
        }
        Ok(allowed)
    }

    /// Folds every stored rule over the context. Deny overrides allow;
    /// no matching rule means `NotApplicable` and callers fall back to
    /// role/permission checks.
    pub async fn evaluate_rules(
        &self,
        ctx: &PermissionContext,
    ) -> Result<RuleOutcome, AccessError> {
        let rules = self.rules.list_rules().await?;
        let mut any_allow = false;
        for rule in &rules {
            match domain::evaluate_rule(rule, ctx) {
                RuleOutcome::Deny => {
                    tracing::debug!(rule_id = %rule.id, actor = %ctx.actor.id, "rule denied access");
                    return Ok(RuleOutcome::Deny);
                }
                RuleOutcome::Allow => any_allow = true,
                RuleOutcome::NotApplicable => {}
            }
        }
        if any_allow {
            Ok(RuleOutcome::Allow)
        } else {
            Ok(RuleOutcome::NotApplicable)
        }
    }

    /// Full decision path: dynamic rules first, then resource-based RBAC as
    /// the fallback when no rule applies.
    pub async fn authorize(&self, ctx: &PermissionContext) -> Result<bool, AccessError> {
        match self.evaluate_rules(ctx).await? {
            RuleOutcome::Deny => Ok(false),
            RuleOutcome::Allow => Ok(true),
            RuleOutcome::NotApplicable => match ctx.resource_id {
                Some(id) => {
                    self.can_access_resource(&ctx.actor, ctx.resource_kind, id, ctx.action)
                        .await
                }
                // No concrete target to fall back to
                None => Ok(false),
            },
        }
    }

    /// Changes a user's role. Re-validates both the management relationship
    /// and the assignability of the new role; never trusts a prior check.
    pub async fn update_user_role(
        &self,
        target_id: Uuid,
        new_role: Role,
        actor: &User,
    ) -> Result<User, AccessError> {
        let target = self.users.get_user(target_id).await?;
        let action = AuditAction::RoleChanged {
            from: target.role,
            to: new_role,
        };

        let allowed = domain::can_manage_user(actor, &target)
            && domain::can_assign_role(actor, new_role, target.company_id);
        if !allowed {
            tracing::warn!(
                actor = %actor.id,
                target_id = %target_id,
                ?new_role,
                "role change denied"
            );
            self.record_audit(PermissionAuditEntry::new(
                target_id, actor.id, action, false,
            ))
            .await;
            return Err(AccessError::insufficient_permissions(
                "Not authorized to assign this role",
            ));
        }

        let updated = self
            .users
            .update_user(
                target_id,
                UserPatch {
                    role: Some(new_role),
                    ..Default::default()
                },
            )
            .await?;

        tracing::debug!(actor = %actor.id, target_id = %target_id, ?new_role, "role updated");
        self.record_audit(PermissionAuditEntry::new(target_id, actor.id, action, true))
            .await;
        Ok(updated)
    }

    /// Grants direct permissions to a user. Set semantics: re-granting an
    /// already-held permission is a no-op.
    pub async fn assign_permissions(
        &self,
        target_id: Uuid,
        permissions: &[Permission],
        actor: &User,
    ) -> Result<User, AccessError> {
        self.grant(target_id, permissions, actor, None).await
    }

    async fn grant(
        &self,
        target_id: Uuid,
        permissions: &[Permission],
        actor: &User,
        action_override: Option<AuditAction>,
    ) -> Result<User, AccessError> {
        let target = self.users.get_user(target_id).await?;
        let action = action_override.unwrap_or(AuditAction::PermissionsGranted {
            permissions: permissions.to_vec(),
        });

        if !self.can_grant(actor, &target, permissions) {
            tracing::warn!(actor = %actor.id, target_id = %target_id, "permission grant denied");
            self.record_audit(PermissionAuditEntry::new(
                target_id, actor.id, action, false,
            ))
            .await;
            return Err(AccessError::insufficient_permissions(
                "Not authorized to grant these permissions",
            ));
        }

        let mut updated_set = target.permissions.clone();
        updated_set.extend(permissions.iter().copied());

        let updated = self
            .users
            .update_user(
                target_id,
                UserPatch {
                    permissions: Some(updated_set),
                    ..Default::default()
                },
            )
            .await?;

        self.record_audit(PermissionAuditEntry::new(target_id, actor.id, action, true))
            .await;
        Ok(updated)
    }

    /// Removes direct grants only; role defaults are untouched, so revoking
    /// a permission the role grants anyway does not take it away.
    pub async fn revoke_permissions(
        &self,
        target_id: Uuid,
        permissions: &[Permission],
        actor: &User,
    ) -> Result<User, AccessError> {
        let target = self.users.get_user(target_id).await?;
        let action = AuditAction::PermissionsRevoked {
            permissions: permissions.to_vec(),
        };

        if !self.can_grant(actor, &target, permissions) {
            tracing::warn!(actor = %actor.id, target_id = %target_id, "permission revoke denied");
            self.record_audit(PermissionAuditEntry::new(
                target_id, actor.id, action, false,
            ))
            .await;
            return Err(AccessError::insufficient_permissions(
                "Not authorized to revoke these permissions",
            ));
        }

        let mut updated_set = target.permissions.clone();
        for permission in permissions {
            updated_set.remove(permission);
        }

        let updated = self
            .users
            .update_user(
                target_id,
                UserPatch {
                    permissions: Some(updated_set),
                    ..Default::default()
                },
            )
            .await?;

        self.record_audit(PermissionAuditEntry::new(target_id, actor.id, action, true))
            .await;
        Ok(updated)
    }

    /// An actor may grant or revoke a permission only when they manage the
    /// target and hold the permission themselves. Holding `manage_platform`
    /// stands in for the management relationship; it never waives the
    /// must-hold rule, so nobody hands out capabilities above their own.
    fn can_grant(&self, actor: &User, target: &User, permissions: &[Permission]) -> bool {
        let manages = domain::has_permission(actor, Permission::ManagePlatform)
            || (domain::has_permission(actor, Permission::ManageCompanyUsers)
                && domain::can_manage_user(actor, target));
        manages && domain::has_all_permissions(actor, permissions)
    }

    /// Applies the same role to every listed user, best-effort-continue:
    /// each member gets the full authorization-before-mutation treatment and
    /// failures are reported in the outcome instead of aborting the batch.
    /// Iteration is sequential, so cancellation falls between members.
    pub async fn bulk_assign_role(
        &self,
        target_ids: &[Uuid],
        new_role: Role,
        actor: &User,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome {
            applied: Vec::new(),
            skipped: Vec::new(),
        };
        for &target_id in target_ids {
            match self.update_user_role(target_id, new_role, actor).await {
                Ok(_) => outcome.applied.push(target_id),
                Err(err) => {
                    tracing::warn!(target_id = %target_id, code = err.error_code(), "bulk role assignment skipped member");
                    outcome.skipped.push(BulkSkip {
                        user_id: target_id,
                        code: err.error_code(),
                        message: err.message().to_string(),
                    });
                }
            }
        }
        outcome
    }

    pub async fn bulk_assign_permissions(
        &self,
        target_ids: &[Uuid],
        permissions: &[Permission],
        actor: &User,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome {
            applied: Vec::new(),
            skipped: Vec::new(),
        };
        for &target_id in target_ids {
            match self.assign_permissions(target_id, permissions, actor).await {
                Ok(_) => outcome.applied.push(target_id),
                Err(err) => {
                    tracing::warn!(target_id = %target_id, code = err.error_code(), "bulk permission grant skipped member");
                    outcome.skipped.push(BulkSkip {
                        user_id: target_id,
                        code: err.error_code(),
                        message: err.message().to_string(),
                    });
                }
            }
        }
        outcome
    }

    /// Creating a template is gated like the grant it stands for: the actor
    /// must be a user manager and hold every bundled permission.
    pub async fn create_template(
        &self,
        name: &str,
        description: &str,
        permissions: &[Permission],
        actor: &User,
    ) -> Result<PermissionTemplate, AccessError> {
        guard::require_any_permission(
            actor,
            &[Permission::ManagePlatform, Permission::ManageCompanyUsers],
        )?;
        if !domain::has_all_permissions(actor, permissions) {
            return Err(AccessError::insufficient_permissions(
                "Cannot bundle permissions you do not hold",
            ));
        }

        let template = PermissionTemplate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.to_string(),
            permissions: permissions.iter().copied().collect(),
            created_at: chrono::Utc::now(),
        };
        Ok(self.templates.create_template(template).await?)
    }

    pub async fn list_templates(&self) -> Result<Vec<PermissionTemplate>, AccessError> {
        Ok(self.templates.list_templates().await?)
    }

    /// Applying a template is permission assignment under another name: same
    /// authorization, same store write, audited as a template application.
    pub async fn apply_template(
        &self,
        name: &str,
        target_id: Uuid,
        actor: &User,
    ) -> Result<User, AccessError> {
        let template = self
            .templates
            .find_template(name)
            .await?
            .ok_or_else(|| AccessError::not_found(format!("template '{}' not found", name)))?;
        let permissions: Vec<Permission> = template.permissions.iter().copied().collect();
        self.grant(
            target_id,
            &permissions,
            actor,
            Some(AuditAction::TemplateApplied {
                template: template.name.clone(),
            }),
        )
        .await
    }

    // Rule lifecycle: platform operators only.

    pub async fn create_rule(
        &self,
        resource_kind: ResourceKind,
        action: ResourceAction,
        condition: RuleCondition,
        effect: RuleEffect,
        actor: &User,
    ) -> Result<PermissionRule, AccessError> {
        guard::require_permission(actor, Permission::ManagePlatform)?;
        let now = chrono::Utc::now();
        let rule = PermissionRule {
            id: Uuid::new_v4(),
            resource_kind,
            action,
            condition,
            effect,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(rule_id = %rule.id, actor = %actor.id, "rule created");
        Ok(self.rules.create_rule(rule).await?)
    }

    pub async fn update_rule(
        &self,
        mut rule: PermissionRule,
        actor: &User,
    ) -> Result<PermissionRule, AccessError> {
        guard::require_permission(actor, Permission::ManagePlatform)?;
        rule.updated_at = chrono::Utc::now();
        Ok(self.rules.update_rule(rule).await?)
    }

    pub async fn delete_rule(&self, id: Uuid, actor: &User) -> Result<(), AccessError> {
        guard::require_permission(actor, Permission::ManagePlatform)?;
        tracing::debug!(rule_id = %id, actor = %actor.id, "rule deleted");
        Ok(self.rules.delete_rule(id).await?)
    }

    pub async fn list_rules(&self, actor: &User) -> Result<Vec<PermissionRule>, AccessError> {
        guard::require_permission(actor, Permission::ManagePlatform)?;
        Ok(self.rules.list_rules().await?)
    }

    /// Read-only audit trail, filtered by user and time range. Entries come
    /// back in append order; sort by timestamp client-side if needed.
    pub async fn audit_trail(
        &self,
        query: AuditQuery,
    ) -> Result<Vec<PermissionAuditEntry>, AccessError> {
        Ok(self.audit.query(query).await?)
    }
}

/// Per-action dispatch for user-kind resources.
fn user_action_allowed(actor: &User, target: &User, action: ResourceAction) -> bool {
    match action {
        ResourceAction::Read => domain::can_view_user_data(actor, target),
        ResourceAction::Update => {
            (actor.id == target.id && domain::has_permission(actor, Permission::ManageProfile))
                || domain::can_manage_user(actor, target)
        }
        ResourceAction::Delete => {
            (actor.id == target.id && domain::has_permission(actor, Permission::DeleteAccount))
                || domain::can_manage_user(actor, target)
        }
        ResourceAction::Create | ResourceAction::Manage => domain::can_manage_user(actor, target),
    }
}
