use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub port: u16,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub limiter: LimiterConfig,
    pub cors: CorsConfig,
    pub mailer: MailerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Which record store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub max_idle_time_secs: u64,
    /// Upper bound for a single store call
    pub query_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    pub enabled: bool,
    /// Sustained requests per second per client
    pub rps: f64,
    /// Maximum instantaneous tokens per client
    pub burst: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub trusted_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub sender: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.port = v.parse().unwrap_or(self.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
                self.storage = StorageBackend::Postgres;
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_MAX_IDLE_TIME_SECS") {
            self.database.max_idle_time_secs = v.parse().unwrap_or(self.database.max_idle_time_secs);
        }
        if let Ok(v) = env::var("STORAGE") {
            self.storage = match v.as_str() {
                "memory" => StorageBackend::Memory,
                "postgres" => StorageBackend::Postgres,
                _ => self.storage,
            };
        }

        // Limiter overrides
        if let Ok(v) = env::var("LIMITER_ENABLED") {
            self.limiter.enabled = v.parse().unwrap_or(self.limiter.enabled);
        }
        if let Ok(v) = env::var("LIMITER_RPS") {
            self.limiter.rps = v.parse().unwrap_or(self.limiter.rps);
        }
        if let Ok(v) = env::var("LIMITER_BURST") {
            self.limiter.burst = v.parse().unwrap_or(self.limiter.burst);
        }

        // CORS overrides (space or comma separated)
        if let Ok(v) = env::var("CORS_TRUSTED_ORIGINS") {
            self.cors.trusted_origins = parse_origins(&v);
        }

        if let Ok(v) = env::var("SMTP_SENDER") {
            self.mailer.sender = v;
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            port: 4000,
            storage: StorageBackend::Memory,
            database: DatabaseConfig {
                url: None,
                max_connections: 25,
                max_idle_time_secs: 15 * 60,
                query_timeout_secs: 3,
            },
            limiter: LimiterConfig {
                enabled: true,
                rps: 2.0,
                burst: 4,
            },
            cors: CorsConfig {
                trusted_origins: vec!["http://localhost:9000".to_string()],
            },
            mailer: MailerConfig {
                sender: "Greenlight <no-reply@greenlight.local>".to_string(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            storage: StorageBackend::Postgres,
            cors: CorsConfig {
                trusted_origins: vec!["https://staging.greenlight.example".to_string()],
            },
            ..Self::development()
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            storage: StorageBackend::Postgres,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                max_idle_time_secs: 15 * 60,
                query_timeout_secs: 3,
            },
            limiter: LimiterConfig {
                enabled: true,
                rps: 4.0,
                burst: 8,
            },
            cors: CorsConfig {
                trusted_origins: Vec::new(),
            },
            ..Self::development()
        }
    }
}

/// Split a list of origins separated by spaces and/or commas
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
