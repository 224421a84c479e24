//! Layered configuration: built-in defaults, then an optional `msgboard.toml`
//! in the working directory, then `MSGBOARD__SECTION__KEY` environment
//! variables (e.g. `MSGBOARD__SERVER__PORT=8080`).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use mb_core::models::ListLimits;
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub board: BoardSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    /// sqlx connection string, e.g. `sqlite:msgboard.db`.
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct BoardSettings {
    pub thread_limit: usize,
    pub reply_limit: usize,
}

/// Argon2id cost parameters for delete passwords.
#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    /// Default filter; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            defaults()?
                .add_source(File::with_name("msgboard").required(false))
                .add_source(
                    Environment::with_prefix("MSGBOARD")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}

impl BoardSettings {
    pub fn limits(&self) -> ListLimits {
        ListLimits {
            threads: self.thread_limit,
            replies: self.reply_limit,
        }
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 3000_i64)?
        .set_default("database.url", "sqlite:msgboard.db")?
        .set_default("database.max_connections", 5_i64)?
        .set_default("board.thread_limit", 10_i64)?
        .set_default("board.reply_limit", 3_i64)?
        // argon2 crate defaults (OWASP minimum for Argon2id)
        .set_default("auth.memory_kib", 19_456_i64)?
        .set_default("auth.iterations", 2_i64)?
        .set_default("auth.parallelism", 1_i64)?
        .set_default("log.level", "info")?
        .set_default("log.format", "pretty")
}
