use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue store error: {0}")]
    Sqlx(#[from] SqlxError),

    #[error("Receipt handle is not valid anymore: {0}")]
    InvalidReceiptHandle(String),

    #[error("Invalid queue request: {0}")]
    InvalidRequest(String),
}
