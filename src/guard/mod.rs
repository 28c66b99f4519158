// Enforcement layer: turns decisions into typed denials.
//
// Each function either returns normally (allow) or raises an [`AccessError`]
// with a fixed code/status pair. Nothing here fails open; the boolean logic
// lives in the domain module and is re-used, never re-implemented.
use uuid::Uuid;

use crate::catalog::{Permission, Role};
use crate::domain;
use crate::error::AccessError;
use crate::models::User;

/// Resolves the authenticated principal. A missing principal is an
/// authentication failure (401); a deactivated account is rejected (403)
/// before any permission is consulted.
pub fn authenticate(principal: Option<&User>) -> Result<&User, AccessError> {
    let user = principal
        .ok_or_else(|| AccessError::authentication_required("Authentication required"))?;
    if !user.is_active {
        tracing::warn!(user_id = %user.id, "rejected request from deactivated account");
        return Err(AccessError::account_inactive("Account is deactivated"));
    }
    Ok(user)
}

pub fn require_permission(user: &User, permission: Permission) -> Result<(), AccessError> {
    if domain::has_permission(user, permission) {
        return Ok(());
    }
    tracing::warn!(user_id = %user.id, ?permission, "permission denied");
    Err(AccessError::insufficient_permissions(
        "Insufficient permissions for this operation",
    ))
}

pub fn require_any_permission(user: &User, permissions: &[Permission]) -> Result<(), AccessError> {
    if domain::has_any_permission(user, permissions) {
        return Ok(());
    }
    tracing::warn!(user_id = %user.id, ?permissions, "permission denied");
    Err(AccessError::insufficient_permissions(
        "Insufficient permissions for this operation",
    ))
}

pub fn require_role(user: &User, role: Role) -> Result<(), AccessError> {
    if user.role == role {
        return Ok(());
    }
    tracing::warn!(user_id = %user.id, required = ?role, actual = ?user.role, "role denied");
    Err(AccessError::role_required(format!(
        "Requires the {} role",
        role.display_name()
    )))
}

pub fn require_any_role(user: &User, roles: &[Role]) -> Result<(), AccessError> {
    if roles.contains(&user.role) {
        return Ok(());
    }
    tracing::warn!(user_id = %user.id, required = ?roles, actual = ?user.role, "role denied");
    Err(AccessError::role_required(
        "Requires a role this account does not hold",
    ))
}

/// Owner of the resource, or a super admin. Company admins do not pass this
/// check; company-scoped reads go through `require_company_access` plus
/// `view_company_data`.
pub fn require_owner_or_admin(user: &User, owner_id: Uuid) -> Result<(), AccessError> {
    if user.id == owner_id || user.role == Role::SuperAdmin {
        return Ok(());
    }
    tracing::warn!(user_id = %user.id, %owner_id, "ownership denied");
    Err(AccessError::ownership_required(
        "Only the owner may access this resource",
    ))
}

pub fn require_company_access(user: &User, company_id: Uuid) -> Result<(), AccessError> {
    if domain::can_access_company(user, company_id) {
        return Ok(());
    }
    tracing::warn!(user_id = %user.id, %company_id, "company access denied");
    Err(AccessError::company_access_denied(
        "No access to this company",
    ))
}

pub fn require_verified_email(user: &User) -> Result<(), AccessError> {
    if user.email_verified {
        return Ok(());
    }
    Err(AccessError::email_verification_required(
        "Email verification required",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn user(role: Role, company_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "guard@example.com".to_string(),
            role,
            company_id,
            permissions: BTreeSet::new(),
            is_active: true,
            email_verified: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_authenticate_missing_principal_is_401() {
        let err = authenticate(None).unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.error_code(), "AUTHENTICATION_REQUIRED");
    }

    #[test]
    fn test_authenticate_inactive_account_is_403() {
        let mut u = user(Role::CompanyUser, None);
        u.is_active = false;
        let err = authenticate(Some(&u)).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.error_code(), "ACCOUNT_INACTIVE");
    }

    #[test]
    fn test_authenticate_returns_active_principal() {
        let u = user(Role::CompanyUser, None);
        assert_eq!(authenticate(Some(&u)).unwrap().id, u.id);
    }

    #[test]
    fn test_require_permission_denies_with_code() {
        let u = user(Role::IndividualUser, None);
        let err = require_permission(&u, Permission::ManagePlatform).unwrap_err();
        assert_eq!(err.error_code(), "INSUFFICIENT_PERMISSIONS");
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_require_any_permission() {
        let u = user(Role::CompanyManager, Some(Uuid::new_v4()));
        assert!(require_any_permission(
            &u,
            &[Permission::ManagePlatform, Permission::ManageCompanyUsers]
        )
        .is_ok());
        assert!(require_any_permission(
            &u,
            &[Permission::ManagePlatform, Permission::ManageCompanies]
        )
        .is_err());
    }

    #[test]
    fn test_require_role_exact_match() {
        let u = user(Role::CompanyAdmin, Some(Uuid::new_v4()));
        assert!(require_role(&u, Role::CompanyAdmin).is_ok());
        let err = require_role(&u, Role::SuperAdmin).unwrap_err();
        assert_eq!(err.error_code(), "ROLE_REQUIRED");
    }

    #[test]
    fn test_require_any_role() {
        let u = user(Role::CompanyManager, Some(Uuid::new_v4()));
        assert!(require_any_role(&u, &[Role::CompanyAdmin, Role::CompanyManager]).is_ok());
        assert!(require_any_role(&u, &[Role::SuperAdmin]).is_err());
    }

    #[test]
    fn test_require_owner_or_admin() {
        let owner = user(Role::IndividualUser, None);
        assert!(require_owner_or_admin(&owner, owner.id).is_ok());

        let root = user(Role::SuperAdmin, None);
        assert!(require_owner_or_admin(&root, owner.id).is_ok());

        let company_admin = user(Role::CompanyAdmin, Some(Uuid::new_v4()));
        let err = require_owner_or_admin(&company_admin, owner.id).unwrap_err();
        assert_eq!(err.error_code(), "OWNERSHIP_REQUIRED");
    }

    #[test]
    fn test_require_company_access() {
        let company = Uuid::new_v4();
        let u = user(Role::CompanyUser, Some(company));
        assert!(require_company_access(&u, company).is_ok());
        let err = require_company_access(&u, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.error_code(), "COMPANY_ACCESS_DENIED");
    }

    #[test]
    fn test_require_verified_email() {
        let mut u = user(Role::CompanyUser, None);
        assert!(require_verified_email(&u).is_ok());
        u.email_verified = false;
        let err = require_verified_email(&u).unwrap_err();
        assert_eq!(err.error_code(), "EMAIL_VERIFICATION_REQUIRED");
    }
}
