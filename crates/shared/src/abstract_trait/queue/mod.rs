use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    domain::{QueueDepth, ReceiveOptions, ReceivedMessage},
    errors::QueueError,
};

pub type DynMessageQueue = Arc<dyn MessageQueueTrait + Send + Sync>;

/// A queue handle bound to one source queue and its dead-letter redrive
/// policy. Delivery is at-least-once: a received message stays hidden for
/// its visibility timeout and comes back unless it is deleted.
#[async_trait]
pub trait MessageQueueTrait {
    fn queue_name(&self) -> &str;

    async fn send_message(&self, body: &str) -> Result<String, QueueError>;

    async fn receive_messages(
        &self,
        opts: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError>;

    async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueError>;

    async fn change_visibility(
        &self,
        receipt_handle: &str,
        timeout: Duration,
    ) -> Result<(), QueueError>;

    async fn depth(&self) -> Result<QueueDepth, QueueError>;

    async fn redrive_dead_letters(&self) -> Result<u64, QueueError>;
}
