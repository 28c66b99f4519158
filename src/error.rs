// Authorization error surface with HTTP status mapping
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::store::StoreError;

/// Typed authorization failure carrying a fixed machine-readable code and an
/// HTTP status. Callers discriminate on `error_code()`, never on the message;
/// the message is for humans and logs.
#[derive(Debug)]
pub enum AccessError {
    // 401 Unauthorized - no valid principal
    AuthenticationRequired(String),

    // 403 Forbidden - valid principal, insufficient grounds
    InsufficientPermissions(String),
    RoleRequired(String),
    CompanyAccessDenied(String),
    OwnershipRequired(String),
    EmailVerificationRequired(String),
    AccountInactive(String),

    // 404 Not Found - referenced user/resource missing
    NotFound(String),

    // 409 Conflict - duplicate template/rule names
    Conflict(String),

    // 503 Service Unavailable - store outage, never disguised as a denial
    StoreUnavailable(String),
}

impl AccessError {
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::AuthenticationRequired(_) => 401,
            AccessError::InsufficientPermissions(_) => 403,
            AccessError::RoleRequired(_) => 403,
            AccessError::CompanyAccessDenied(_) => 403,
            AccessError::OwnershipRequired(_) => 403,
            AccessError::EmailVerificationRequired(_) => 403,
            AccessError::AccountInactive(_) => 403,
            AccessError::NotFound(_) => 404,
            AccessError::Conflict(_) => 409,
            AccessError::StoreUnavailable(_) => 503,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AccessError::AuthenticationRequired(_) => "AUTHENTICATION_REQUIRED",
            AccessError::InsufficientPermissions(_) => "INSUFFICIENT_PERMISSIONS",
            AccessError::RoleRequired(_) => "ROLE_REQUIRED",
            AccessError::CompanyAccessDenied(_) => "COMPANY_ACCESS_DENIED",
            AccessError::OwnershipRequired(_) => "OWNERSHIP_REQUIRED",
            AccessError::EmailVerificationRequired(_) => "EMAIL_VERIFICATION_REQUIRED",
            AccessError::AccountInactive(_) => "ACCOUNT_INACTIVE",
            AccessError::NotFound(_) => "NOT_FOUND",
            AccessError::Conflict(_) => "CONFLICT",
            AccessError::StoreUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Client-safe message
    pub fn message(&self) -> &str {
        match self {
            AccessError::AuthenticationRequired(msg) => msg,
            AccessError::InsufficientPermissions(msg) => msg,
            AccessError::RoleRequired(msg) => msg,
            AccessError::CompanyAccessDenied(msg) => msg,
            AccessError::OwnershipRequired(msg) => msg,
            AccessError::EmailVerificationRequired(msg) => msg,
            AccessError::AccountInactive(msg) => msg,
            AccessError::NotFound(msg) => msg,
            AccessError::Conflict(msg) => msg,
            AccessError::StoreUnavailable(msg) => msg,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructors, one per check kind
impl AccessError {
    pub fn authentication_required(message: impl Into<String>) -> Self {
        AccessError::AuthenticationRequired(message.into())
    }

    pub fn insufficient_permissions(message: impl Into<String>) -> Self {
        AccessError::InsufficientPermissions(message.into())
    }

    pub fn role_required(message: impl Into<String>) -> Self {
        AccessError::RoleRequired(message.into())
    }

    pub fn company_access_denied(message: impl Into<String>) -> Self {
        AccessError::CompanyAccessDenied(message.into())
    }

    pub fn ownership_required(message: impl Into<String>) -> Self {
        AccessError::OwnershipRequired(message.into())
    }

    pub fn email_verification_required(message: impl Into<String>) -> Self {
        AccessError::EmailVerificationRequired(message.into())
    }

    pub fn account_inactive(message: impl Into<String>) -> Self {
        AccessError::AccountInactive(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AccessError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AccessError::Conflict(message.into())
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        AccessError::StoreUnavailable(message.into())
    }
}

impl From<StoreError> for AccessError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => AccessError::not_found(msg),
            StoreError::Conflict(msg) => AccessError::conflict(msg),
            StoreError::Unavailable(msg) => {
                // Log the real cause but keep the client message generic
                tracing::error!("store unavailable: {}", msg);
                AccessError::store_unavailable("Persistence layer temporarily unavailable")
            }
        }
    }
}

impl std::fmt::Display for AccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AccessError {}

// Automatic HTTP response conversion for Axum hosts
impl IntoResponse for AccessError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
