use clap::Parser;

use crate::config::{parse_origins, AppConfig, StorageBackend};

/// Command-line overrides; anything left unset keeps the value from
/// `AppConfig::from_env`.
#[derive(Debug, Default, Parser)]
#[command(name = "greenlight-api")]
#[command(about = "Greenlight movie catalogue JSON API server")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "API server port")]
    pub port: Option<u16>,

    #[arg(long, value_enum, help = "Record store backing the service")]
    pub storage: Option<StorageBackend>,

    #[arg(long = "db-dsn", help = "PostgreSQL connection string")]
    pub db_dsn: Option<String>,

    #[arg(long = "db-max-open-conns", help = "PostgreSQL max open connections")]
    pub db_max_open_conns: Option<u32>,

    #[arg(long = "db-max-idle-time", help = "PostgreSQL max connection idle time in seconds")]
    pub db_max_idle_time: Option<u64>,

    #[arg(long = "limiter-rps", help = "Rate limiter maximum requests per second")]
    pub limiter_rps: Option<f64>,

    #[arg(long = "limiter-burst", help = "Rate limiter maximum burst")]
    pub limiter_burst: Option<u32>,

    #[arg(long = "limiter-enabled", help = "Enable rate limiter")]
    pub limiter_enabled: Option<bool>,

    #[arg(long = "cors-trusted-origins", help = "Trusted CORS origins (space or comma separated)")]
    pub cors_trusted_origins: Option<String>,

    #[arg(long = "smtp-sender", help = "Sender address for outgoing mail")]
    pub smtp_sender: Option<String>,
}

impl Cli {
    /// Layer the flags that were given on top of `config`
    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(storage) = self.storage {
            config.storage = storage;
        }
        if let Some(dsn) = self.db_dsn {
            config.database.url = Some(dsn);
        }
        if let Some(n) = self.db_max_open_conns {
            config.database.max_connections = n;
        }
        if let Some(secs) = self.db_max_idle_time {
            config.database.max_idle_time_secs = secs;
        }
        if let Some(rps) = self.limiter_rps {
            config.limiter.rps = rps;
        }
        if let Some(burst) = self.limiter_burst {
            config.limiter.burst = burst;
        }
        if let Some(enabled) = self.limiter_enabled {
            config.limiter.enabled = enabled;
        }
        if let Some(origins) = self.cors_trusted_origins {
            config.cors.trusted_origins = parse_origins(&origins);
        }
        if let Some(sender) = self.smtp_sender {
            config.mailer.sender = sender;
        }
        config
    }
}
