// Persistence collaborator contracts consumed by the permission service.
//
// The engine owns no storage of its own: user records belong to the identity
// subsystem, audit entries and rules/templates are appended/managed through
// these traits. Per-record atomicity is the store's responsibility.
use async_trait::async_trait;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::catalog::{Permission, Role};
use crate::models::{
    AuditQuery, PermissionAuditEntry, PermissionRule, PermissionTemplate, ResourceKind, User,
};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Partial update applied to a user record. Only the fields this engine owns
/// are patchable; a single patch is assumed atomic at the store.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub role: Option<Role>,
    pub permissions: Option<BTreeSet<Permission>>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::NotFound`] when the user does not exist.
    async fn get_user(&self, id: Uuid) -> Result<User, StoreError>;

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append-only. Callers treat failures as degradation, not as failure of
    /// the audited operation.
    async fn append(&self, entry: PermissionAuditEntry) -> Result<(), StoreError>;

    /// Returns entries in append order; no timestamp sort is guaranteed.
    async fn query(&self, query: AuditQuery) -> Result<Vec<PermissionAuditEntry>, StoreError>;
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn create_rule(&self, rule: PermissionRule) -> Result<PermissionRule, StoreError>;
    async fn update_rule(&self, rule: PermissionRule) -> Result<PermissionRule, StoreError>;
    async fn delete_rule(&self, id: Uuid) -> Result<(), StoreError>;
    async fn list_rules(&self) -> Result<Vec<PermissionRule>, StoreError>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] on a duplicate name.
    async fn create_template(
        &self,
        template: PermissionTemplate,
    ) -> Result<PermissionTemplate, StoreError>;

    async fn list_templates(&self) -> Result<Vec<PermissionTemplate>, StoreError>;

    async fn find_template(&self, name: &str) -> Result<Option<PermissionTemplate>, StoreError>;
}

/// Resolved ownership of a stored resource (journal entry, mood entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOwner {
    pub owner_id: Uuid,
    pub company_id: Option<Uuid>,
}

/// Narrow lookup used by resource-based authorization. `Ok(None)` means the
/// resource does not exist or the kind has no ownership record, and the
/// caller denies.
#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    async fn resource_owner(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> Result<Option<ResourceOwner>, StoreError>;
}
