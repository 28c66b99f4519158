use serde::{Deserialize, Serialize};
use std::env;

/// Engine configuration, injected into [`PermissionService`] by value.
/// No global singleton: embedders construct one per service instance.
///
/// [`PermissionService`]: crate::services::PermissionService
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Audit read-only permission checks in addition to mutations. Mutations
    /// are always audited regardless of this flag.
    pub audit_read_checks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit_read_checks: true,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("ACCESS_AUDIT_READ_CHECKS") {
            self.audit_read_checks = v.parse().unwrap_or(self.audit_read_checks);
        }
        self
    }
}
