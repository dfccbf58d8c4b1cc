use chrono::{DateTime, Utc};
use shared::{
    abstract_trait::DynMessageQueue,
    domain::{ReceiveOptions, ReceivedMessage},
    errors::QueueError,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};
use tokio::{
    sync::{
        Mutex,
        broadcast::{self, error::TryRecvError},
    },
    time::{Instant, sleep},
};
use tracing::{debug, error, info, warn};

use crate::{
    abstract_trait::DynOrderProcessingService,
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerSnapshot, FailureKind},
    config::PollConfig,
    metrics::{Outcome, ProcessorMetrics},
};

/// Pause after a failed receive that did not open the breaker.
pub const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// State shared between the polling loop and the health endpoint.
#[derive(Debug)]
pub struct PollerStatus {
    pub(crate) breaker: Mutex<CircuitBreaker>,
    last_successful_poll: Mutex<Option<DateTime<Utc>>>,
    processed: AtomicU64,
    failed: AtomicU64,
    started_at: Instant,
}

impl PollerStatus {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breaker: Mutex::new(CircuitBreaker::new(config)),
            last_successful_poll: Mutex::new(None),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    pub async fn breaker_snapshot(&self) -> CircuitBreakerSnapshot {
        self.breaker.lock().await.snapshot()
    }

    pub async fn last_successful_poll(&self) -> Option<DateTime<Utc>> {
        *self.last_successful_poll.lock().await
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    async fn mark_polled(&self) {
        *self.last_successful_poll.lock().await = Some(Utc::now());
    }
}

pub struct OrderPollerDeps {
    pub queue: DynMessageQueue,
    pub service: DynOrderProcessingService,
    pub status: Arc<PollerStatus>,
    pub metrics: ProcessorMetrics,
    pub poll: PollConfig,
}

/// Long-polls the order queue and feeds messages one at a time to the
/// processing service. Messages are deleted only after they were persisted.
pub struct OrderPoller {
    queue: DynMessageQueue,
    service: DynOrderProcessingService,
    status: Arc<PollerStatus>,
    metrics: ProcessorMetrics,
    options: ReceiveOptions,
}

enum BatchEnd {
    Drained,
    BreakerOpened,
    Shutdown,
}

impl OrderPoller {
    pub fn new(deps: OrderPollerDeps) -> Self {
        let OrderPollerDeps {
            queue,
            service,
            status,
            metrics,
            poll,
        } = deps;

        Self {
            queue,
            service,
            status,
            metrics,
            options: ReceiveOptions {
                max_messages: poll.max_messages,
                wait_time: poll.wait_time,
                visibility_timeout: None,
            },
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            "🚀 Order poller started on queue '{}' (batch {}, wait {}s)",
            self.queue.queue_name(),
            self.options.max_messages,
            self.options.wait_time.as_secs()
        );

        loop {
            if let Some(cooldown) = self.remaining_cooldown().await {
                info!(
                    "⏸️ Circuit breaker open, polling paused for {}s",
                    cooldown.as_secs_f64().ceil()
                );

                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = sleep(cooldown) => continue,
                }
            }

            let received = tokio::select! {
                _ = shutdown.recv() => break,
                received = self.queue.receive_messages(&self.options) => received,
            };

            let messages = match received {
                Ok(messages) => messages,
                Err(e) => {
                    error!("❌ Failed to receive from order queue: {e}");

                    if !self.record_failure(FailureKind::Receive).await {
                        tokio::select! {
                            _ = shutdown.recv() => break,
                            _ = sleep(RECEIVE_ERROR_BACKOFF) => {}
                        }
                    }
                    continue;
                }
            };

            self.status.mark_polled().await;
            self.record_receive_success().await;

            if messages.is_empty() {
                continue;
            }

            debug!("📥 Received {} order message(s)", messages.len());
            self.metrics
                .messages_received
                .inc_by(messages.len() as u64);

            match self.handle_batch(messages, &mut shutdown).await {
                BatchEnd::Drained => {}
                BatchEnd::BreakerOpened => continue,
                BatchEnd::Shutdown => break,
            }
        }

        info!("🛑 Order poller stopped");
    }

    async fn handle_batch(
        &self,
        messages: Vec<ReceivedMessage>,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> BatchEnd {
        let mut pending = messages.into_iter();

        while let Some(message) = pending.next() {
            let breaker_opened = self.handle_message(&message).await;

            if breaker_opened {
                self.release(pending).await;
                return BatchEnd::BreakerOpened;
            }

            if !matches!(shutdown.try_recv(), Err(TryRecvError::Empty)) {
                self.release(pending).await;
                return BatchEnd::Shutdown;
            }
        }

        BatchEnd::Drained
    }

    /// Returns `true` when the outcome opened the circuit breaker.
    async fn handle_message(&self, message: &ReceivedMessage) -> bool {
        let started = Instant::now();
        let result = self.service.process(&message.body).await;
        self.metrics
            .processing_duration
            .observe(started.elapsed().as_secs_f64());

        if let Err(e) = result {
            warn!(
                message_id = %message.message_id,
                receive_count = message.receive_count,
                "⚠️ Order message failed, leaving it for redelivery: {e}"
            );
            return self.record_outcome_failure().await;
        }

        match self.queue.delete_message(&message.receipt_handle).await {
            Ok(()) => {
                self.status.processed.fetch_add(1, Ordering::Relaxed);
                self.metrics.record(Outcome::Success);
                self.record_success().await;
                false
            }
            Err(QueueError::InvalidReceiptHandle(_)) => {
                warn!(
                    message_id = %message.message_id,
                    "⚠️ Receipt handle expired before delete, message will be redelivered"
                );
                self.record_outcome_failure().await
            }
            Err(e) => {
                error!(
                    message_id = %message.message_id,
                    "❌ Failed to delete processed message: {e}"
                );
                self.record_outcome_failure().await
            }
        }
    }

    async fn release(&self, rest: impl Iterator<Item = ReceivedMessage>) {
        for message in rest {
            match self
                .queue
                .change_visibility(&message.receipt_handle, Duration::ZERO)
                .await
            {
                Ok(()) => {
                    self.metrics.record(Outcome::Released);
                    debug!(message_id = %message.message_id, "↩️ Released message back to queue");
                }
                Err(e) => {
                    warn!(
                        message_id = %message.message_id,
                        "⚠️ Could not release message, it returns after its visibility timeout: {e}"
                    );
                }
            }
        }
    }

    async fn record_outcome_failure(&self) -> bool {
        self.status.failed.fetch_add(1, Ordering::Relaxed);
        self.metrics.record(Outcome::Failure);
        self.record_failure(FailureKind::Processing).await
    }

    async fn record_failure(&self, kind: FailureKind) -> bool {
        let mut breaker = self.status.breaker.lock().await;
        let opened = breaker.record_failure(kind);

        if opened {
            self.metrics.circuit_breaker_trips.inc();
            warn!(
                "🔌 Circuit breaker opened after {} consecutive failure(s)",
                breaker.snapshot().consecutive_failures
            );
        }

        self.metrics.set_breaker_state(breaker.state());
        opened
    }

    async fn record_success(&self) {
        let mut breaker = self.status.breaker.lock().await;
        breaker.record_success();
        self.metrics.set_breaker_state(breaker.state());
    }

    async fn record_receive_success(&self) {
        let mut breaker = self.status.breaker.lock().await;
        breaker.record_receive_success();
        self.metrics.set_breaker_state(breaker.state());
    }

    async fn remaining_cooldown(&self) -> Option<Duration> {
        let mut breaker = self.status.breaker.lock().await;
        let remaining = breaker.remaining_cooldown();
        self.metrics.set_breaker_state(breaker.state());
        remaining
    }
}
