use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{pin::pin, time::Duration};
use tokio::{
    sync::{Mutex, Notify},
    time::{Instant, sleep_until},
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    abstract_trait::MessageQueueTrait,
    config::QueueConfig,
    domain::{QueueDepth, ReceiveOptions, ReceivedMessage, validate_visibility_timeout},
    errors::QueueError,
};

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    receive_count: i32,
    receipt_handle: Option<String>,
    visible_at: Instant,
    sent_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct QueueState {
    source: Vec<StoredMessage>,
    dead_letters: Vec<StoredMessage>,
}

impl QueueState {
    fn redrive_exhausted(&mut self, max_receive_count: i32, now: Instant) -> usize {
        let (exhausted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.source)
            .into_iter()
            .partition(|m| m.visible_at <= now && m.receive_count >= max_receive_count);

        self.source = kept;
        let moved = exhausted.len();

        self.dead_letters
            .extend(exhausted.into_iter().map(|mut m| {
                m.receipt_handle = None;
                m
            }));

        moved
    }

    fn next_visible_at(&self, now: Instant) -> Option<Instant> {
        self.source
            .iter()
            .map(|m| m.visible_at)
            .filter(|at| *at > now)
            .min()
    }
}

/// Process-local queue with the same delivery rules as the Postgres backend.
/// Visibility runs on the tokio clock, so paused-time tests can drive it.
pub struct InMemoryQueue {
    config: QueueConfig,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl InMemoryQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        }
    }

    pub async fn dead_letter_bodies(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.dead_letters.iter().map(|m| m.body.clone()).collect()
    }

    pub async fn receive_count_of(&self, message_id: &str) -> Option<i32> {
        let state = self.state.lock().await;
        state
            .source
            .iter()
            .chain(state.dead_letters.iter())
            .find(|m| m.message_id == message_id)
            .map(|m| m.receive_count)
    }
}

#[async_trait]
impl MessageQueueTrait for InMemoryQueue {
    fn queue_name(&self) -> &str {
        &self.config.name
    }

    async fn send_message(&self, body: &str) -> Result<String, QueueError> {
        let message_id = Uuid::new_v4().to_string();

        let mut state = self.state.lock().await;
        state.source.push(StoredMessage {
            message_id: message_id.clone(),
            body: body.to_string(),
            receive_count: 0,
            receipt_handle: None,
            visible_at: Instant::now(),
            sent_at: Utc::now(),
        });
        drop(state);

        self.notify.notify_waiters();
        Ok(message_id)
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
            let mut notified = pin!(self.notify.notified());
            notified.as_mut().enable();

            let mut state = self.state.lock().await;
            let now = Instant::now();

            let moved = state.redrive_exhausted(self.config.max_receive_count, now);
            if moved > 0 {
                warn!(
                    queue = %self.config.name,
                    dead_letter_queue = %self.config.dead_letter_name,
                    moved,
                    "☠️ Moved messages to dead-letter queue after {} receives",
                    self.config.max_receive_count
                );
            }

            let limit = opts.max_messages as usize;
            let mut received = Vec::new();

            for message in state.source.iter_mut() {
                if received.len() == limit {
                    break;
                }
                if message.visible_at > now {
                    continue;
                }

                let receipt = Uuid::new_v4().to_string();
                message.receive_count += 1;
                message.receipt_handle = Some(receipt.clone());
                message.visible_at = now + visibility_timeout;

                received.push(ReceivedMessage {
                    message_id: message.message_id.clone(),
                    receipt_handle: receipt,
                    body: message.body.clone(),
                    receive_count: message.receive_count,
                    sent_at: message.sent_at,
                });
            }

            if !received.is_empty() || now >= deadline {
                return Ok(received);
            }

            let wake_at = state
                .next_visible_at(now)
                .map_or(deadline, |at| at.min(deadline));
            drop(state);

            tokio::select! {
                _ = notified => {}
                _ = sleep_until(wake_at) => {}
            }
        }
    }

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;

        let position = state
            .source
            .iter()
            .position(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
            .ok_or_else(|| QueueError::InvalidReceiptHandle(receipt_handle.to_string()))?;

        state.source.remove(position);
        Ok(())
    }

    async fn change_visibility(
        &self,
        receipt_handle: &str,
        timeout: Duration,
    ) -> Result<(), QueueError> {
        validate_visibility_timeout(timeout)?;

        let mut state = self.state.lock().await;

        let message = state
            .source
            .iter_mut()
            .find(|m| m.receipt_handle.as_deref() == Some(receipt_handle))
            .ok_or_else(|| QueueError::InvalidReceiptHandle(receipt_handle.to_string()))?;

        message.visible_at = Instant::now() + timeout;
        drop(state);

        if timeout.is_zero() {
            self.notify.notify_waiters();
        }
        Ok(())
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        let state = self.state.lock().await;
        let now = Instant::now();

        let visible = state.source.iter().filter(|m| m.visible_at <= now).count();

        Ok(QueueDepth {
            visible: visible as i64,
            in_flight: (state.source.len() - visible) as i64,
            dead_lettered: state.dead_letters.len() as i64,
        })
    }

    async fn redrive_dead_letters(&self) -> Result<u64, QueueError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let redriven: Vec<_> = std::mem::take(&mut state.dead_letters)
            .into_iter()
            .map(|mut m| {
                m.receive_count = 0;
                m.receipt_handle = None;
                m.visible_at = now;
                m
            })
            .collect();

        let moved = redriven.len() as u64;
        state.source.extend(redriven);
        drop(state);

        if moved > 0 {
            self.notify.notify_waiters();
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn queue() -> InMemoryQueue {
        InMemoryQueue::new(QueueConfig::default())
    }

    fn batch(max_messages: i64) -> ReceiveOptions {
        ReceiveOptions {
            max_messages,
            ..ReceiveOptions::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn receives_in_send_order_and_hides_in_flight() {
        let q = queue();
        q.send_message("a").await.unwrap();
        q.send_message("b").await.unwrap();
        q.send_message("c").await.unwrap();

        let first = q.receive_messages(&batch(2)).await.unwrap();
        let bodies: Vec<_> = first.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["a", "b"]);
        assert!(first.iter().all(|m| m.receive_count == 1));

        let second = q.receive_messages(&batch(10)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].body, "c");

        let depth = q.depth().await.unwrap();
        assert_eq!(depth.visible, 0);
        assert_eq!(depth.in_flight, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn message_reappears_after_visibility_timeout() {
        let q = queue();
        let id = q.send_message("order").await.unwrap();

        let first = q.receive_messages(&batch(1)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(q.receive_messages(&batch(1)).await.unwrap().is_empty());

        tokio::time::advance(Duration::from_secs(31)).await;

        let again = q.receive_messages(&batch(1)).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].message_id, id);
        assert_eq!(again[0].receive_count, 2);
        assert_ne!(again[0].receipt_handle, first[0].receipt_handle);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_receipt_cannot_delete() {
        let q = queue();
        q.send_message("order").await.unwrap();

        let first = q.receive_messages(&batch(1)).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        let second = q.receive_messages(&batch(1)).await.unwrap();

        let err = q
            .delete_message(&first[0].receipt_handle)
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidReceiptHandle(_)));

        q.delete_message(&second[0].receipt_handle).await.unwrap();
        assert_eq!(q.depth().await.unwrap(), QueueDepth::default());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_message_moves_to_dead_letter_queue() {
        let q = queue();
        q.send_message("poison").await.unwrap();

        for _ in 0..3 {
            let received = q.receive_messages(&batch(1)).await.unwrap();
            assert_eq!(received.len(), 1);
            tokio::time::advance(Duration::from_secs(31)).await;
        }

        assert!(q.receive_messages(&batch(1)).await.unwrap().is_empty());
        assert_eq!(q.dead_letter_bodies().await, ["poison"]);

        let depth = q.depth().await.unwrap();
        assert_eq!(depth.dead_lettered, 1);
        assert_eq!(depth.visible + depth.in_flight, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn redrive_resets_receive_count() {
        let q = queue();
        let id = q.send_message("poison").await.unwrap();

        for _ in 0..3 {
            q.receive_messages(&batch(1)).await.unwrap();
            tokio::time::advance(Duration::from_secs(31)).await;
        }
        q.receive_messages(&batch(1)).await.unwrap();

        assert_eq!(q.redrive_dead_letters().await.unwrap(), 1);
        assert_eq!(q.receive_count_of(&id).await, Some(0));

        let received = q.receive_messages(&batch(1)).await.unwrap();
        assert_eq!(received[0].receive_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn change_visibility_zero_releases_immediately() {
        let q = queue();
        q.send_message("order").await.unwrap();

        let received = q.receive_messages(&batch(1)).await.unwrap();
        q.change_visibility(&received[0].receipt_handle, Duration::ZERO)
            .await
            .unwrap();

        let again = q.receive_messages(&batch(1)).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].receive_count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn long_poll_returns_when_message_arrives() {
        let q = Arc::new(queue());

        let consumer = {
            let q = q.clone();
            tokio::spawn(async move {
                q.receive_messages(&ReceiveOptions {
                    max_messages: 1,
                    wait_time: Duration::from_secs(20),
                    visibility_timeout: None,
                })
                .await
            })
        };

        tokio::time::sleep(Duration::from_secs(2)).await;
        q.send_message("late").await.unwrap();

        let received = consumer.await.unwrap().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].body, "late");
    }

    #[tokio::test(start_paused = true)]
    async fn long_poll_times_out_empty() {
        let q = queue();
        let started = Instant::now();

        let received = q
            .receive_messages(&ReceiveOptions {
                max_messages: 5,
                wait_time: Duration::from_secs(3),
                visibility_timeout: None,
            })
            .await
            .unwrap();

        assert!(received.is_empty());
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn rejects_out_of_range_batch() {
        let q = queue();
        let err = q.receive_messages(&batch(11)).await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidRequest(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_visibility_timeout_is_rejected() {
        let q = queue();
        q.send_message("order").await.unwrap();
        let received = q.receive_messages(&batch(1)).await.unwrap();

        let err = q
            .change_visibility(&received[0].receipt_handle, Duration::from_secs(u64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::InvalidRequest(_)));

        let opts = ReceiveOptions {
            visibility_timeout: Some(Duration::from_secs(u64::MAX)),
            ..batch(1)
        };
        let err = q.receive_messages(&opts).await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidRequest(_)));
    }
}
