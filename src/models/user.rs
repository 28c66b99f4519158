use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::catalog::{Permission, Role};

/// User record as read from the identity store. The engine reads these for
/// decisions and writes back `role`/`permissions` on authorized mutations;
/// everything else is owned by the identity subsystem.
///
/// `permissions` holds direct grants beyond the role defaults. It is additive
/// only - revoking a direct grant never subtracts from the role's default set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub permissions: BTreeSet<Permission>,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
