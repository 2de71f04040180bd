use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::identity::Identity;
use crate::database::models::User;
use crate::database::PermissionStore;
use crate::error::ApiError;

pub fn require_authenticated(identity: &Identity) -> Result<&User, ApiError> {
    identity.user().ok_or(ApiError::AuthenticationRequired)
}

pub fn require_activated(identity: &Identity) -> Result<&User, ApiError> {
    let user = require_authenticated(identity)?;
    if !user.activated {
        return Err(ApiError::InactiveAccount);
    }
    Ok(user)
}

/// Activated user holding `code`. Permissions are fetched fresh on every
/// request, so a revoked grant takes effect immediately.
pub async fn require_permission_for(
    identity: &Identity,
    permissions: &dyn PermissionStore,
    code: &str,
) -> Result<(), ApiError> {
    let user = require_activated(identity)?;
    let granted = permissions.get_all_for_user(user.id).await?;
    if !granted.include(code) {
        return Err(ApiError::NotPermitted);
    }
    Ok(())
}

/// Route-layer state naming the permission a route requires
#[derive(Clone)]
pub struct PermissionGuard {
    permissions: Arc<dyn PermissionStore>,
    code: &'static str,
}

impl PermissionGuard {
    pub fn new(permissions: Arc<dyn PermissionStore>, code: &'static str) -> Self {
        Self { permissions, code }
    }
}

pub async fn require_activated_user(request: Request, next: Next) -> Response {
    match require_activated(&Identity::from_extensions(request.extensions())) {
        Ok(_) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

pub async fn require_permission(State(guard): State<PermissionGuard>, request: Request, next: Next) -> Response {
    let identity = Identity::from_extensions(request.extensions());
    match require_permission_for(&identity, guard.permissions.as_ref(), guard.code).await {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
