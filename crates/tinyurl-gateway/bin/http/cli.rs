use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;
use tinyurl_gateway::telemetry::LogFormat;

pub const LISTEN_ADDR_ENV: &str = "TINYURL_APP_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "TINYURL_APP_STORAGE_BACKEND";
pub const REDIS_ADDR_ENV: &str = "TINYURL_APP_REDIS_ADDR";
pub const REDIS_PASSWORD_ENV: &str = "TINYURL_APP_REDIS_PWD";
pub const REDIS_DB_ENV: &str = "TINYURL_APP_REDIS_DB";
pub const STORE_TIMEOUT_ENV: &str = "TINYURL_APP_STORE_TIMEOUT_MS";
pub const KEY_PREFIX_ENV: &str = "TINYURL_APP_KEY_PREFIX";
pub const LOG_FORMAT_ENV: &str = "TINYURL_APP_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_REDIS_ADDR: &str = "localhost:6479";
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tinyurl-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Redis
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = REDIS_ADDR_ENV, default_value = DEFAULT_REDIS_ADDR)]
    pub redis_addr: String,

    #[arg(long, env = REDIS_PASSWORD_ENV, default_value = "", hide_env_values = true)]
    pub redis_password: String,

    #[arg(long, env = REDIS_DB_ENV, default_value_t = 0)]
    pub redis_db: u32,

    #[arg(long, env = STORE_TIMEOUT_ENV, default_value_t = DEFAULT_STORE_TIMEOUT_MS)]
    pub store_timeout_ms: u64,

    #[arg(
        long,
        env = KEY_PREFIX_ENV,
        default_value = tinyurl_shortener::keyspace::DEFAULT_PREFIX
    )]
    pub key_prefix: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl CLI {
    /// Connection string for the configured Redis server.
    pub fn redis_url(&self) -> String {
        if self.redis_password.is_empty() {
            format!("redis://{}/{}", self.redis_addr, self.redis_db)
        } else {
            format!(
                "redis://:{}@{}/{}",
                self.redis_password, self.redis_addr, self.redis_db
            )
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
