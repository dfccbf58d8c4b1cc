use anyhow::{Context, Result};
use shared::config::{DatabaseConfig, QueueConfig, env_flag, env_or, env_required};

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub port: u16,
    pub jwt_secret: String,
    pub otel_endpoint: String,
    pub is_dev: bool,
    pub enable_file_log: bool,
}

impl Config {
    pub fn init() -> Result<Self> {
        let database = DatabaseConfig::init().context("Invalid database configuration")?;
        let queue = QueueConfig::init().context("Invalid queue configuration")?;

        let port: u16 = env_or("PORT", 5000).context("PORT must be a valid u16 integer")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let otel_endpoint: String =
            env_or("OTEL_ENDPOINT", "http://otel-collector:4317".to_string())?;

        Ok(Self {
            database,
            queue,
            port,
            jwt_secret,
            otel_endpoint,
            is_dev: env_flag("DEV_MODE")?,
            enable_file_log: env_flag("ENABLE_FILE_LOG")?,
        })
    }
}
