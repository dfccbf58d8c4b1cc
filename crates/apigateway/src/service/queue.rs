use crate::{abstract_trait::QueueServiceTrait, domain::response::RedriveResponse};
use async_trait::async_trait;
use shared::{
    abstract_trait::DynMessageQueue,
    domain::{ApiResponse, QueueDepth},
    errors::ServiceError,
};
use tracing::{error, info};

#[derive(Clone)]
pub struct QueueService {
    queue: DynMessageQueue,
}

impl QueueService {
    pub fn new(queue: DynMessageQueue) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl QueueServiceTrait for QueueService {
    async fn stats(&self) -> Result<ApiResponse<QueueDepth>, ServiceError> {
        let depth = self.queue.depth().await.map_err(|e| {
            error!("❌ Failed to read queue depth: {e}");
            ServiceError::Queue(e)
        })?;

        Ok(ApiResponse::success(
            format!("Depth of queue '{}'", self.queue.queue_name()),
            depth,
        ))
    }

    async fn redrive_dead_letters(&self) -> Result<ApiResponse<RedriveResponse>, ServiceError> {
        let moved = self.queue.redrive_dead_letters().await.map_err(|e| {
            error!("❌ Failed to redrive dead letters: {e}");
            ServiceError::Queue(e)
        })?;

        info!("🔁 Redrove {moved} dead-lettered order message(s)");

        Ok(ApiResponse::success(
            "Dead-lettered messages moved back to the source queue",
            RedriveResponse { moved },
        ))
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        self.queue.depth().await.map(|_| ()).map_err(ServiceError::Queue)
    }
}
