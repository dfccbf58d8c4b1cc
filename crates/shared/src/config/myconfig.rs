use anyhow::{Context, Result, anyhow};
use std::{fmt::Display, str::FromStr, time::Duration};

use crate::domain::{MAX_RECEIVE_BATCH, MAX_VISIBILITY_TIMEOUT, MAX_WAIT_TIME};

pub fn env_required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Missing environment variable: {key}"))
}

pub fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

/// Unset means `false`; anything other than `true`/`false`/`1`/`0` is rejected.
pub fn env_flag(key: &str) -> Result<bool> {
    match std::env::var(key) {
        Ok(raw) => match raw.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(anyhow!("{key} must be 'true' or 'false', got '{other}'")),
        },
        Err(_) => Ok(false),
    }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub name: String,
    pub dead_letter_name: String,
    pub max_receive_count: i32,
    pub visibility_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "orders".into(),
            dead_letter_name: "orders-dlq".into(),
            max_receive_count: 3,
            visibility_timeout: Duration::from_secs(30),
        }
    }
}

impl QueueConfig {
    pub fn init() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            name: env_or("ORDER_QUEUE_NAME", defaults.name)?,
            dead_letter_name: env_or("ORDER_DLQ_NAME", defaults.dead_letter_name)?,
            max_receive_count: env_or("QUEUE_MAX_RECEIVE_COUNT", defaults.max_receive_count)?,
            visibility_timeout: Duration::from_secs(env_or(
                "QUEUE_VISIBILITY_TIMEOUT_SECONDS",
                defaults.visibility_timeout.as_secs(),
            )?),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("ORDER_QUEUE_NAME must not be empty"));
        }

        if self.name == self.dead_letter_name {
            return Err(anyhow!(
                "dead-letter queue must differ from the source queue ('{}')",
                self.name
            ));
        }

        if self.max_receive_count < 1 {
            return Err(anyhow!(
                "QUEUE_MAX_RECEIVE_COUNT must be at least 1, got {}",
                self.max_receive_count
            ));
        }

        if self.visibility_timeout.is_zero() {
            return Err(anyhow!("QUEUE_VISIBILITY_TIMEOUT_SECONDS must be positive"));
        }

        if self.visibility_timeout > MAX_VISIBILITY_TIMEOUT {
            return Err(anyhow!(
                "QUEUE_VISIBILITY_TIMEOUT_SECONDS must be at most {}, got {}",
                MAX_VISIBILITY_TIMEOUT.as_secs(),
                self.visibility_timeout.as_secs()
            ));
        }

        Ok(())
    }
}

/// Bounds shared by every consumer of the queue.
pub fn validate_receive_bounds(max_messages: i64, wait_time: Duration) -> Result<()> {
    if !(1..=MAX_RECEIVE_BATCH).contains(&max_messages) {
        return Err(anyhow!(
            "POLL_MAX_MESSAGES must be between 1 and {MAX_RECEIVE_BATCH}, got {max_messages}"
        ));
    }

    if wait_time > MAX_WAIT_TIME {
        return Err(anyhow!(
            "POLL_WAIT_TIME_SECONDS must be at most {}, got {}",
            MAX_WAIT_TIME.as_secs(),
            wait_time.as_secs()
        ));
    }

    Ok(())
}
