#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Duration as TokenTtl;
use reqwest::{RequestBuilder, StatusCode};

use greenlight::auth::{password, Token, TokenScope};
use greenlight::config::{AppConfig, StorageBackend};
use greenlight::database::models::{Movie, Runtime, User};
use greenlight::database::{MemoryStore, Models, MovieStore, PermissionStore, TokenStore, UserStore};
use greenlight::mailer::{RecordingMailer, SentMessage};
use greenlight::{router, AppState};

/// A server running in-process on its own port, backed by the memory store
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub client: reqwest::Client,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.storage = StorageBackend::Memory;
    config.limiter.enabled = false;
    config
}

/// Boot a server with the default test configuration (rate limiting off)
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(test_config()).await
}

pub async fn spawn_server_with(mut config: AppConfig) -> Result<TestServer> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    config.port = port;

    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let state = AppState::new(config, Models::from_memory(store.clone()), mailer.clone())
        .context("failed to build app state")?;

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tokio::spawn(async move {
        let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server stopped: {}", e);
        }
    });

    Ok(TestServer {
        port,
        base_url: format!("http://{}", addr),
        store,
        mailer,
        client: reqwest::Client::new(),
    })
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    /// Insert a user directly into the store together with a live
    /// authentication token; returns the user and the token plaintext
    pub async fn seed_user(&self, email: &str, activated: bool, permissions: &[&str]) -> Result<(User, String)> {
        let mut user = User::new("Test User", email, Vec::new());
        user.activated = activated;
        UserStore::insert(self.store.as_ref(), &mut user).await?;
        self.store.grant_for_user(user.id, permissions).await?;

        let token = Token::generate(user.id, TokenTtl::hours(24), TokenScope::Authentication);
        TokenStore::insert(self.store.as_ref(), &token).await?;

        Ok((user, token.plaintext))
    }

    /// Insert a user whose password can be checked by the login endpoint
    pub async fn seed_user_with_password(&self, email: &str, plaintext: &str, activated: bool) -> Result<User> {
        let mut user = User::new("Test User", email, password::hash(plaintext).await?);
        user.activated = activated;
        UserStore::insert(self.store.as_ref(), &mut user).await?;
        Ok(user)
    }

    pub async fn seed_movie(&self, title: &str, year: i32, genres: &[&str]) -> Result<Movie> {
        let genres = genres.iter().map(|g| g.to_string()).collect();
        let mut movie = Movie::new(title, year, Runtime(100), genres);
        MovieStore::insert(self.store.as_ref(), &mut movie).await?;
        Ok(movie)
    }

    /// Wait for a background task to hand a message for `to` to the mailer
    pub async fn wait_for_mail(&self, to: &str, timeout: Duration) -> Result<SentMessage> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(message) = self.mailer.sent().into_iter().find(|m| m.to == to) {
                return Ok(message);
            }
            if Instant::now() > deadline {
                anyhow::bail!("no mail for {} within {:?}", to, timeout);
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// The `error` field of a rejection body
pub async fn error_body(res: reqwest::Response, expected: StatusCode) -> Result<serde_json::Value> {
    assert_eq!(res.status(), expected, "unexpected status");
    let body = res.json::<serde_json::Value>().await?;
    body.get("error")
        .cloned()
        .with_context(|| format!("missing error field: {}", body))
}
