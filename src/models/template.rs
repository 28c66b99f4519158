use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::catalog::Permission;

/// Named, reusable permission bundle. Applying a template is bulk permission
/// assignment under another name and reuses that authorization path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub permissions: BTreeSet<Permission>,
    pub created_at: DateTime<Utc>,
}
