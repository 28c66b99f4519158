#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use wellness_access::catalog::{Permission, Role};
use wellness_access::config::EngineConfig;
use wellness_access::models::{AuditQuery, PermissionAuditEntry, User};
use wellness_access::services::PermissionService;
use wellness_access::store::{
    AuditStore, MemoryStore, ResourceDirectory, RuleStore, StoreError, TemplateStore, UserStore,
};

/// Service wired to a single in-memory store for all collaborator roles.
pub fn harness() -> (Arc<MemoryStore>, PermissionService) {
    let store = Arc::new(MemoryStore::new());
    let service = PermissionService::new(
        store.clone() as Arc<dyn UserStore>,
        store.clone() as Arc<dyn AuditStore>,
        store.clone() as Arc<dyn RuleStore>,
        store.clone() as Arc<dyn TemplateStore>,
        store.clone() as Arc<dyn ResourceDirectory>,
        EngineConfig::default(),
    );
    (store, service)
}

/// Same harness but with read-check auditing off, so tests counting audit
/// entries only see mutation entries.
pub fn quiet_harness() -> (Arc<MemoryStore>, PermissionService) {
    let store = Arc::new(MemoryStore::new());
    let service = PermissionService::new(
        store.clone() as Arc<dyn UserStore>,
        store.clone() as Arc<dyn AuditStore>,
        store.clone() as Arc<dyn RuleStore>,
        store.clone() as Arc<dyn TemplateStore>,
        store.clone() as Arc<dyn ResourceDirectory>,
        EngineConfig {
            audit_read_checks: false,
        },
    );
    (store, service)
}

pub fn user(role: Role, company_id: Option<Uuid>) -> User {
    User {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", Uuid::new_v4().simple()),
        role,
        company_id,
        permissions: BTreeSet::new(),
        is_active: true,
        email_verified: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn super_admin() -> User {
    user(Role::SuperAdmin, None)
}

pub fn user_with_permissions(
    role: Role,
    company_id: Option<Uuid>,
    permissions: &[Permission],
) -> User {
    let mut u = user(role, company_id);
    u.permissions = permissions.iter().copied().collect();
    u
}

/// Audit store that always fails, for exercising the degraded path.
pub struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn append(&self, _entry: PermissionAuditEntry) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("audit pipeline down".to_string()))
    }

    async fn query(&self, _query: AuditQuery) -> Result<Vec<PermissionAuditEntry>, StoreError> {
        Err(StoreError::Unavailable("audit pipeline down".to_string()))
    }
}

/// Harness whose audit collaborator always fails; user/rule/template stores
/// keep working.
pub fn degraded_harness() -> (Arc<MemoryStore>, PermissionService) {
    let store = Arc::new(MemoryStore::new());
    let service = PermissionService::new(
        store.clone() as Arc<dyn UserStore>,
        Arc::new(FailingAuditStore) as Arc<dyn AuditStore>,
        store.clone() as Arc<dyn RuleStore>,
        store.clone() as Arc<dyn TemplateStore>,
        store.clone() as Arc<dyn ResourceDirectory>,
        EngineConfig::default(),
    );
    (store, service)
}
