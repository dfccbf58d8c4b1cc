use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    abstract_trait::MessageQueueTrait,
    config::{ConnectionPool, QueueConfig},
    domain::{QueueDepth, ReceiveOptions, ReceivedMessage, validate_visibility_timeout},
    errors::QueueError,
};

const LONG_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, FromRow)]
struct ReceivedRow {
    id: i64,
    message_id: Uuid,
    receipt_handle: Uuid,
    body: String,
    receive_count: i32,
    sent_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DepthRow {
    visible: i64,
    in_flight: i64,
    dead_lettered: i64,
}

/// Queue stored in the `queue_messages` table. Concurrent consumers are safe:
/// selection uses `FOR UPDATE SKIP LOCKED`.
#[derive(Clone)]
pub struct PostgresQueue {
    db: ConnectionPool,
    config: QueueConfig,
}

impl PostgresQueue {
    pub fn new(db: ConnectionPool, config: QueueConfig) -> Self {
        Self { db, config }
    }

    async fn try_receive(
        &self,
        max_messages: i64,
        visibility_timeout: Duration,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        let mut tx = self.db.begin().await?;

        let moved = sqlx::query(
            r#"
            UPDATE queue_messages
            SET queue_name = $2,
                receipt_handle = NULL,
                visible_at = now(),
                dead_lettered_at = now()
            WHERE id IN (
                SELECT id FROM queue_messages
                WHERE queue_name = $1
                  AND visible_at <= now()
                  AND receive_count >= $3
                ORDER BY id
                FOR UPDATE SKIP LOCKED
            )
            "#,
        )
        .bind(&self.config.name)
        .bind(&self.config.dead_letter_name)
        .bind(self.config.max_receive_count)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if moved > 0 {
            warn!(
                queue = %self.config.name,
                dead_letter_queue = %self.config.dead_letter_name,
                moved,
                "☠️ Moved messages to dead-letter queue after {} receives",
                self.config.max_receive_count
            );
        }

        let mut rows = sqlx::query_as::<_, ReceivedRow>(
            r#"
            UPDATE queue_messages AS m
            SET receive_count = m.receive_count + 1,
                receipt_handle = gen_random_uuid(),
                visible_at = now() + make_interval(secs => $3)
            FROM (
                SELECT id FROM queue_messages
                WHERE queue_name = $1
                  AND visible_at <= now()
                ORDER BY id
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            ) AS next
            WHERE m.id = next.id
            RETURNING m.id, m.message_id, m.receipt_handle, m.body, m.receive_count, m.sent_at
            "#,
        )
        .bind(&self.config.name)
        .bind(max_messages)
        .bind(visibility_timeout.as_secs_f64())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        rows.sort_by_key(|row| row.id);

        Ok(rows
            .into_iter()
            .map(|row| ReceivedMessage {
                message_id: row.message_id.to_string(),
                receipt_handle: row.receipt_handle.to_string(),
                body: row.body,
                receive_count: row.receive_count,
                sent_at: row.sent_at,
            })
            .collect())
    }

    fn parse_receipt(receipt_handle: &str) -> Result<Uuid, QueueError> {
        Uuid::parse_str(receipt_handle)
            .map_err(|_| QueueError::InvalidReceiptHandle(receipt_handle.to_string()))
    }
}

#[async_trait]
impl MessageQueueTrait for PostgresQueue {
    fn queue_name(&self) -> &str {
        &self.config.name
    }

    async fn send_message(&self, body: &str) -> Result<String, QueueError> {
        let message_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO queue_messages (message_id, queue_name, body)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(message_id)
        .bind(&self.config.name)
        .bind(body)
        .execute(&self.db)
        .await
        .map_err(|err| {
            error!(queue = %self.config.name, "❌ Failed to enqueue message: {err:?}");
            QueueError::from(err)
        })?;

        debug!(queue = %self.config.name, %message_id, "📨 Message enqueued");
        Ok(message_id.to_string())
    }

    async fn receive_messages(
        &self,
        opts: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        opts.validate()?;

        let visibility_timeout = opts
            .visibility_timeout
            .unwrap_or(self.config.visibility_timeout);
        let deadline = Instant::now() + opts.wait_time;

        loop {
            let messages = self
                .try_receive(opts.max_messages, visibility_timeout)
                .await?;

            let now = Instant::now();
            if !messages.is_empty() || now >= deadline {
                return Ok(messages);
            }

            sleep(LONG_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let receipt = Self::parse_receipt(receipt_handle)?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM queue_messages
            WHERE queue_name = $1 AND receipt_handle = $2
            "#,
        )
        .bind(&self.config.name)
        .bind(receipt)
        .execute(&self.db)
        .await?
        .rows_affected();

        if deleted == 0 {
            return Err(QueueError::InvalidReceiptHandle(receipt_handle.to_string()));
        }

        Ok(())
    }

    async fn change_visibility(
        &self,
        receipt_handle: &str,
        timeout: Duration,
    ) -> Result<(), QueueError> {
        validate_visibility_timeout(timeout)?;
        let receipt = Self::parse_receipt(receipt_handle)?;

        let updated = sqlx::query(
            r#"
            UPDATE queue_messages
            SET visible_at = now() + make_interval(secs => $3)
            WHERE queue_name = $1 AND receipt_handle = $2
            "#,
        )
        .bind(&self.config.name)
        .bind(receipt)
        .bind(timeout.as_secs_f64())
        .execute(&self.db)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(QueueError::InvalidReceiptHandle(receipt_handle.to_string()));
        }

        Ok(())
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        let row = sqlx::query_as::<_, DepthRow>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE queue_name = $1 AND visible_at <= now()) AS visible,
                COUNT(*) FILTER (WHERE queue_name = $1 AND visible_at > now()) AS in_flight,
                COUNT(*) FILTER (WHERE queue_name = $2) AS dead_lettered
            FROM queue_messages
            WHERE queue_name IN ($1, $2)
            "#,
        )
        .bind(&self.config.name)
        .bind(&self.config.dead_letter_name)
        .fetch_one(&self.db)
        .await?;

        Ok(QueueDepth {
            visible: row.visible,
            in_flight: row.in_flight,
            dead_lettered: row.dead_lettered,
        })
    }

    async fn redrive_dead_letters(&self) -> Result<u64, QueueError> {
        let moved = sqlx::query(
            r#"
            UPDATE queue_messages
            SET queue_name = $1,
                receive_count = 0,
                receipt_handle = NULL,
                visible_at = now(),
                dead_lettered_at = NULL
            WHERE queue_name = $2
            "#,
        )
        .bind(&self.config.name)
        .bind(&self.config.dead_letter_name)
        .execute(&self.db)
        .await?
        .rows_affected();

        info!(
            queue = %self.config.name,
            moved,
            "🔁 Redrove dead-lettered messages back to source queue"
        );

        Ok(moved)
    }
}
