use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
    Router,
};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;

use crate::auth::{PERMISSION_MOVIES_READ, PERMISSION_MOVIES_WRITE};
use crate::config::AppConfig;
use crate::database::Models;
use crate::handlers;
use crate::limiter::TokenBucketRegistry;
use crate::mailer::Mailer;
use crate::middleware::{
    authenticate, enable_cors, log_server_errors, method_not_allowed, rate_limit, recover_panic,
    require_activated_user, require_permission, track_metrics, HttpMetrics, PermissionGuard,
};

/// Process-wide state shared by every request worker
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub models: Models,
    pub limiter: Arc<TokenBucketRegistry>,
    pub mailer: Arc<dyn Mailer>,
    pub metrics: Arc<HttpMetrics>,
}

impl AppState {
    pub fn new(config: AppConfig, models: Models, mailer: Arc<dyn Mailer>) -> prometheus::Result<Self> {
        let limiter = Arc::new(TokenBucketRegistry::new(config.limiter.clone()));
        Ok(Self {
            config: Arc::new(config),
            models,
            limiter,
            mailer,
            metrics: Arc::new(HttpMetrics::new()?),
        })
    }

    /// Run fire-and-forget work after the response has been produced. Errors
    /// and panics inside `task` are logged here and never reach the caller.
    pub fn background<F>(&self, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        tokio::spawn(async move {
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(task = name, "Background task failed: {:#}", e),
                Err(panic) => error!(task = name, "Background task panicked: {}", panic_message(panic.as_ref())),
            }
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Full route table wrapped in the request pipeline:
/// metrics -> trace -> error log -> panic recovery -> CORS -> rate limit -> authenticate -> route guards -> handler
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/healthcheck", get(handlers::healthcheck))
        .route("/v1/metrics", get(handlers::metrics))
        .merge(user_routes())
        .merge(token_routes())
        .merge(movie_routes(&state))
        .fallback(handlers::not_found)
        .layer(from_fn(method_not_allowed))
        .layer(DefaultBodyLimit::max(handlers::utils::MAX_BODY_BYTES))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn_with_state(state.clone(), enable_cors))
        .layer(CatchPanicLayer::custom(recover_panic))
        .layer(from_fn(log_server_errors))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn_with_state(state.clone(), track_metrics))
        .with_state(state)
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new()
        .route("/v1/users", post(users::register))
        .route("/v1/users/activate", put(users::activate))
        .route(
            "/v1/users/password",
            put(users::update_password).route_layer(from_fn(require_activated_user)),
        )
}

fn token_routes() -> Router<AppState> {
    use handlers::tokens;

    Router::new()
        .route("/v1/tokens/authentication", post(tokens::create_authentication_token))
        .route(
            "/v1/tokens/password-reset",
            post(tokens::create_password_reset_token).route_layer(from_fn(require_activated_user)),
        )
}

fn movie_routes(state: &AppState) -> Router<AppState> {
    use handlers::movies;

    let read = || {
        from_fn_with_state(
            PermissionGuard::new(state.models.permissions.clone(), PERMISSION_MOVIES_READ),
            require_permission,
        )
    };
    let write = || {
        from_fn_with_state(
            PermissionGuard::new(state.models.permissions.clone(), PERMISSION_MOVIES_WRITE),
            require_permission,
        )
    };

    Router::new()
        .route(
            "/v1/movies",
            get(movies::list)
                .route_layer(read())
                .merge(post(movies::create).route_layer(write())),
        )
        .route(
            "/v1/movies/:id",
            get(movies::show)
                .route_layer(read())
                .merge(patch(movies::update).delete(movies::delete).route_layer(write())),
        )
}
