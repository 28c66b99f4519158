pub mod permission_service;

pub use permission_service::{BulkOutcome, BulkSkip, PermissionService};
