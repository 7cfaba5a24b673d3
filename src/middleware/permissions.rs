//! Permission system with type-safe authorization extractors
//!
//! Usage in handlers:
//! ```ignore
//! use crate::middleware::permissions::{Authorized, RequestsResolve};
//!
//! async fn resolve_request(
//!     admin: Authorized<RequestsResolve>,
//!     State(state): State<AppState>,
//! ) -> Result<Json<...>> {
//!     // Permission already verified; admin.user() is the caller
//! }
//! ```
//!
//! Permissions are derived statically from the account's staff role; there
//! are no role or permission tables.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::middleware::AuthenticatedUser;
use crate::models::user;

/// Trait for permission marker types
pub trait Permission: Send + Sync + 'static {
    /// The permission string (e.g., "staff.view")
    const NAME: &'static str;
}

/// Macro to define permission types
///
/// Creates zero-sized marker types that implement `Permission`
macro_rules! define_permissions {
    ($($(#[$meta:meta])* $name:ident => $perm:expr),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Permission for $name {
                const NAME: &'static str = $perm;
            }
        )*
    };
}

define_permissions! {
    // Staff management
    /// View staff list and details
    StaffView => "staff.view",
    /// Create, update, deactivate staff accounts
    StaffManage => "staff.manage",

    // Role change workflow
    /// Approve or reject role change requests
    RequestsResolve => "requests.resolve",

    // Notifications
    /// Send direct messages and broadcasts
    NotificationsSend => "notifications.send",

    // Audit
    /// View audit logs
    AuditView => "audit.view",
}

/// Extractor that requires a specific permission
///
/// Verifies that the authenticated user's role grants the permission before
/// the handler runs; otherwise a 403 Forbidden error is returned.
#[derive(Debug, Clone)]
pub struct Authorized<P: Permission>(pub user::Model, PhantomData<P>);

impl<P: Permission> Authorized<P> {
    pub fn user(&self) -> &user::Model {
        &self.0
    }

    pub fn user_id(&self) -> i64 {
        self.0.id
    }
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: Permission,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        if !auth_user.has_permission(P::NAME) {
            return Err(AppError::Forbidden(format!(
                "Permission denied: {} required",
                P::NAME
            )));
        }

        Ok(Authorized(auth_user.user.clone(), PhantomData))
    }
}

/// Extractor for any authenticated user (no specific permission required)
#[derive(Debug, Clone)]
pub struct Authenticated(pub user::Model);

impl Authenticated {
    pub fn user(&self) -> &user::Model {
        &self.0
    }

    pub fn user_id(&self) -> i64 {
        self.0.id
    }
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        Ok(Authenticated(auth_user.user.clone()))
    }
}
