use axum::extract::State;
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;

use super::utils::JsonBody;
use crate::app::AppState;
use crate::auth::{password, Token, TokenScope};
use crate::database::{StoreError, TokenStore, UserStore};
use crate::error::ApiError;
use crate::mailer::TEMPLATE_PASSWORD_RESET;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validator::Validator;

pub const AUTHENTICATION_TTL_HOURS: i64 = 24;
pub const PASSWORD_RESET_TTL_MINUTES: i64 = 45;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordResetInput {
    pub email: String,
}

/// POST /v1/tokens/authentication
pub async fn create_authentication_token(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CredentialsInput>,
) -> ApiResult {
    let mut v = Validator::new();
    password::validate_email(&mut v, &input.email);
    password::validate_password(&mut v, &input.password);
    v.finish()?;

    // Unknown email and wrong password are indistinguishable to the caller
    let user = match state.models.users.get_by_email(&input.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(ApiError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    let matched = password::matches(&input.password, &user.password_hash)
        .await
        .map_err(ApiError::server_error)?;
    if !matched {
        return Err(ApiError::InvalidCredentials);
    }

    let token = Token::generate(
        user.id,
        Duration::hours(AUTHENTICATION_TTL_HOURS),
        TokenScope::Authentication,
    );
    state.models.tokens.insert(&token).await?;

    ApiResponse::created("token", token)
}

/// POST /v1/tokens/password-reset
pub async fn create_password_reset_token(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<PasswordResetInput>,
) -> ApiResult {
    let mut v = Validator::new();
    password::validate_email(&mut v, &input.email);
    v.finish()?;

    let user = match state.models.users.get_by_email(&input.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => {
            return Err(ApiError::validation("email", "no matching email address found"))
        }
        Err(e) => return Err(e.into()),
    };

    if !user.activated {
        return Err(ApiError::validation("email", "user account must be activated"));
    }

    let token = Token::generate(
        user.id,
        Duration::minutes(PASSWORD_RESET_TTL_MINUTES),
        TokenScope::PasswordReset,
    );
    state.models.tokens.insert(&token).await?;

    let mailer = state.mailer.clone();
    let to = user.email.clone();
    state.background("password reset email", async move {
        let data = json!({ "passwordResetToken": token.plaintext });
        mailer.send(&to, TEMPLATE_PASSWORD_RESET, data).await?;
        Ok::<_, anyhow::Error>(())
    });

    ApiResponse::accepted(
        "message",
        "an email will be sent to you containing password reset instructions",
    )
}
