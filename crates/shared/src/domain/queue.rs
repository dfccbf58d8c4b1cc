use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

use crate::errors::QueueError;

pub const MAX_RECEIVE_BATCH: i64 = 10;
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(20);
pub const MAX_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

pub fn validate_visibility_timeout(timeout: Duration) -> Result<(), QueueError> {
    if timeout > MAX_VISIBILITY_TIMEOUT {
        return Err(QueueError::InvalidRequest(format!(
            "visibility timeout must be at most {}s, got {}s",
            MAX_VISIBILITY_TIMEOUT.as_secs(),
            timeout.as_secs()
        )));
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub message_id: String,
    pub receipt_handle: String,
    pub body: String,
    pub receive_count: i32,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReceiveOptions {
    pub max_messages: i64,
    pub wait_time: Duration,
    /// Falls back to the queue's configured timeout when unset.
    pub visibility_timeout: Option<Duration>,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 1,
            wait_time: Duration::ZERO,
            visibility_timeout: None,
        }
    }
}

impl ReceiveOptions {
    pub fn validate(&self) -> Result<(), QueueError> {
        if !(1..=MAX_RECEIVE_BATCH).contains(&self.max_messages) {
            return Err(QueueError::InvalidRequest(format!(
                "max_messages must be between 1 and {MAX_RECEIVE_BATCH}, got {}",
                self.max_messages
            )));
        }

        if self.wait_time > MAX_WAIT_TIME {
            return Err(QueueError::InvalidRequest(format!(
                "wait_time must be at most {}s, got {}s",
                MAX_WAIT_TIME.as_secs(),
                self.wait_time.as_secs()
            )));
        }

        if let Some(timeout) = self.visibility_timeout {
            validate_visibility_timeout(timeout)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QueueDepth {
    pub visible: i64,
    pub in_flight: i64,
    pub dead_lettered: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_size_bounds() {
        let mut opts = ReceiveOptions::default();
        assert!(opts.validate().is_ok());

        opts.max_messages = 0;
        assert!(opts.validate().is_err());

        opts.max_messages = 11;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn long_poll_capped_at_twenty_seconds() {
        let opts = ReceiveOptions {
            max_messages: 10,
            wait_time: Duration::from_secs(21),
            visibility_timeout: None,
        };
        assert!(matches!(opts.validate(), Err(QueueError::InvalidRequest(_))));
    }

    #[test]
    fn visibility_timeout_capped_at_twelve_hours() {
        let mut opts = ReceiveOptions {
            visibility_timeout: Some(MAX_VISIBILITY_TIMEOUT),
            ..ReceiveOptions::default()
        };
        assert!(opts.validate().is_ok());

        opts.visibility_timeout = Some(MAX_VISIBILITY_TIMEOUT + Duration::from_secs(1));
        assert!(matches!(opts.validate(), Err(QueueError::InvalidRequest(_))));

        assert!(validate_visibility_timeout(Duration::from_secs(u64::MAX)).is_err());
    }
}
