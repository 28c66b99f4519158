// In-memory store backing integration tests and embedded deployments.
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    AuditQuery, PermissionAuditEntry, PermissionRule, PermissionTemplate, ResourceKind, User,
};
use crate::store::{
    AuditStore, ResourceDirectory, ResourceOwner, RuleStore, StoreError, TemplateStore, UserPatch,
    UserStore,
};

/// Implements every collaborator trait over `tokio::sync::RwLock` maps.
/// Audit entries live in a plain append-order vector.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    audit: RwLock<Vec<PermissionAuditEntry>>,
    rules: RwLock<HashMap<Uuid, PermissionRule>>,
    templates: RwLock<HashMap<Uuid, PermissionTemplate>>,
    resources: RwLock<HashMap<(ResourceKind, Uuid), ResourceOwner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    /// Registers ownership for a journal or mood entry so resource-based
    /// checks can resolve it.
    pub async fn register_resource(&self, kind: ResourceKind, id: Uuid, owner: ResourceOwner) {
        self.resources.write().await.insert((kind, id), owner);
    }

    pub async fn audit_len(&self) -> usize {
        self.audit.read().await.len()
    }

    /// Test convenience: current state of a user that is known to exist.
    pub async fn get_user_snapshot(&self, id: Uuid) -> User {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .expect("user present in store")
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(permissions) = patch.permissions {
            user.permissions = permissions;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: PermissionAuditEntry) -> Result<(), StoreError> {
        self.audit.write().await.push(entry);
        Ok(())
    }

    async fn query(&self, query: AuditQuery) -> Result<Vec<PermissionAuditEntry>, StoreError> {
        let audit = self.audit.read().await;
        Ok(audit
            .iter()
            .filter(|entry| {
                query.user_id.map_or(true, |id| entry.user_id == id)
                    && query.from.map_or(true, |from| entry.timestamp >= from)
                    && query.until.map_or(true, |until| entry.timestamp <= until)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn create_rule(&self, rule: PermissionRule) -> Result<PermissionRule, StoreError> {
        let mut rules = self.rules.write().await;
        if rules.contains_key(&rule.id) {
            return Err(StoreError::Conflict(format!("rule {}", rule.id)));
        }
        rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn update_rule(&self, rule: PermissionRule) -> Result<PermissionRule, StoreError> {
        let mut rules = self.rules.write().await;
        if !rules.contains_key(&rule.id) {
            return Err(StoreError::NotFound(format!("rule {}", rule.id)));
        }
        rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn delete_rule(&self, id: Uuid) -> Result<(), StoreError> {
        self.rules
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("rule {}", id)))
    }

    async fn list_rules(&self) -> Result<Vec<PermissionRule>, StoreError> {
        Ok(self.rules.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn create_template(
        &self,
        template: PermissionTemplate,
    ) -> Result<PermissionTemplate, StoreError> {
        let mut templates = self.templates.write().await;
        if templates.values().any(|t| t.name == template.name) {
            return Err(StoreError::Conflict(format!(
                "template '{}' already exists",
                template.name
            )));
        }
        templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn list_templates(&self) -> Result<Vec<PermissionTemplate>, StoreError> {
        Ok(self.templates.read().await.values().cloned().collect())
    }

    async fn find_template(&self, name: &str) -> Result<Option<PermissionTemplate>, StoreError> {
        Ok(self
            .templates
            .read()
            .await
            .values()
            .find(|t| t.name == name)
            .cloned())
    }
}

#[async_trait]
impl ResourceDirectory for MemoryStore {
    async fn resource_owner(
        &self,
        kind: ResourceKind,
        id: Uuid,
    ) -> Result<Option<ResourceOwner>, StoreError> {
        Ok(self.resources.read().await.get(&(kind, id)).copied())
    }
}
