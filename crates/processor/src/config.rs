use anyhow::{Context, Result, anyhow};
use shared::config::{
    DatabaseConfig, QueueConfig, env_flag, env_or, validate_receive_bounds,
};
use std::{net::SocketAddr, time::Duration};

use crate::circuit_breaker::CircuitBreakerConfig;

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub max_messages: i64,
    pub wait_time: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time: Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub poll: PollConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub health_port: u16,
    pub kafka_broker: Option<String>,
    pub otel_endpoint: String,
    pub is_dev: bool,
    pub enable_file_log: bool,
}

impl Config {
    pub fn init() -> Result<Self> {
        let database = DatabaseConfig::init().context("Invalid database configuration")?;
        let queue = QueueConfig::init().context("Invalid queue configuration")?;

        let poll_defaults = PollConfig::default();
        let poll = PollConfig {
            max_messages: env_or("POLL_MAX_MESSAGES", poll_defaults.max_messages)?,
            wait_time: Duration::from_secs(env_or(
                "POLL_WAIT_TIME_SECONDS",
                poll_defaults.wait_time.as_secs(),
            )?),
        };
        validate_receive_bounds(poll.max_messages, poll.wait_time)?;

        let circuit_breaker = CircuitBreakerConfig {
            threshold: env_or("CIRCUIT_BREAKER_THRESHOLD", 5)?,
            cooldown: Duration::from_secs(env_or("CIRCUIT_BREAKER_COOLDOWN_SECONDS", 60)?),
        };
        circuit_breaker.validate()?;

        let health_port: u16 = env_or("HEALTH_PORT", 8081)?;

        let kafka_broker = std::env::var("KAFKA")
            .ok()
            .filter(|brokers| !brokers.trim().is_empty());

        let otel_endpoint: String =
            env_or("OTEL_ENDPOINT", "http://otel-collector:4317".to_string())?;

        let is_dev = env_flag("DEV_MODE")?;
        let enable_file_log = env_flag("ENABLE_FILE_LOG")?;

        Ok(Self {
            database,
            queue,
            poll,
            circuit_breaker,
            health_port,
            kafka_broker,
            otel_endpoint,
            is_dev,
            enable_file_log,
        })
    }

    pub fn health_addr(&self) -> Result<SocketAddr> {
        format!("0.0.0.0:{}", self.health_port)
            .parse()
            .map_err(|e| anyhow!("Invalid health address: {e}"))
    }
}
