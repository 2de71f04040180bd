use axum::extract::State;
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;

use super::utils::JsonBody;
use crate::app::AppState;
use crate::auth::{password, token, Token, TokenScope, PERMISSION_MOVIES_READ};
use crate::database::models::User;
use crate::database::{PermissionStore, StoreError, TokenStore, UserStore};
use crate::error::ApiError;
use crate::mailer::TEMPLATE_USER_WELCOME;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validator::Validator;

/// Lifetime of an activation token
pub const ACTIVATION_TTL_DAYS: i64 = 3;

/// Permissions every new account starts with
pub const DEFAULT_PERMISSIONS: &[&str] = &[PERMISSION_MOVIES_READ];

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivateInput {
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResetPasswordInput {
    pub password: String,
    pub token: String,
}

/// Owner of a live token of `scope`; an unknown or expired token is a
/// validation failure on the `token` field
async fn user_for_token(state: &AppState, plaintext: &str, scope: TokenScope, message: &str) -> Result<User, ApiError> {
    let hash = token::hash_plaintext(plaintext);
    match state.models.users.get_by_token(&hash, scope).await {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound) => Err(ApiError::validation("token", message)),
        Err(e) => Err(e.into()),
    }
}

/// POST /v1/users
pub async fn register(State(state): State<AppState>, JsonBody(input): JsonBody<RegisterInput>) -> ApiResult {
    let mut user = User::new(input.name, input.email, Vec::new());

    let mut v = Validator::new();
    user.validate(&mut v);
    password::validate_password(&mut v, &input.password);
    v.finish()?;

    user.password_hash = password::hash(&input.password)
        .await
        .map_err(ApiError::server_error)?;

    state.models.users.insert(&mut user).await?;
    state
        .models
        .permissions
        .grant_for_user(user.id, DEFAULT_PERMISSIONS)
        .await?;

    let activation = Token::generate(user.id, Duration::days(ACTIVATION_TTL_DAYS), TokenScope::Activation);
    state.models.tokens.insert(&activation).await?;

    let mailer = state.mailer.clone();
    let (to, user_id) = (user.email.clone(), user.id);
    state.background("welcome email", async move {
        let data = json!({ "activationToken": activation.plaintext, "userID": user_id });
        mailer.send(&to, TEMPLATE_USER_WELCOME, data).await?;
        Ok::<_, anyhow::Error>(())
    });

    ApiResponse::created("user", user)
}

/// PUT /v1/users/activate
pub async fn activate(State(state): State<AppState>, JsonBody(input): JsonBody<ActivateInput>) -> ApiResult {
    let mut v = Validator::new();
    token::validate_plaintext(&mut v, &input.token);
    v.finish()?;

    let mut user = user_for_token(
        &state,
        &input.token,
        TokenScope::Activation,
        "invalid or expired activation token",
    )
    .await?;

    user.activated = true;
    state.models.users.update(&mut user).await?;

    state
        .models
        .tokens
        .delete_all_for_user(TokenScope::Activation, user.id)
        .await?;

    ApiResponse::success("user", user)
}

/// PUT /v1/users/password
pub async fn update_password(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ResetPasswordInput>,
) -> ApiResult {
    let mut v = Validator::new();
    password::validate_password(&mut v, &input.password);
    token::validate_plaintext(&mut v, &input.token);
    v.finish()?;

    let mut user = user_for_token(
        &state,
        &input.token,
        TokenScope::PasswordReset,
        "invalid or expired password reset token",
    )
    .await?;

    user.password_hash = password::hash(&input.password)
        .await
        .map_err(ApiError::server_error)?;
    state.models.users.update(&mut user).await?;

    state
        .models
        .tokens
        .delete_all_for_user(TokenScope::PasswordReset, user.id)
        .await?;

    ApiResponse::success("message", "your password was successfully reset")
}
