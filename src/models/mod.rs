pub mod audit;
pub mod rule;
pub mod template;
pub mod user;

pub use audit::{AuditAction, AuditQuery, PermissionAuditEntry};
pub use rule::{
    PermissionContext, PermissionRule, ResourceAction, ResourceKind, RuleCondition, RuleEffect,
};
pub use template::PermissionTemplate;
pub use user::User;
