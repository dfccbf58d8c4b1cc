use crate::domain::response::RedriveResponse;
use async_trait::async_trait;
use shared::{
    domain::{ApiResponse, QueueDepth},
    errors::ServiceError,
};
use std::sync::Arc;

pub type DynQueueService = Arc<dyn QueueServiceTrait + Send + Sync>;

#[async_trait]
pub trait QueueServiceTrait {
    async fn stats(&self) -> Result<ApiResponse<QueueDepth>, ServiceError>;
    async fn redrive_dead_letters(&self) -> Result<ApiResponse<RedriveResponse>, ServiceError>;
    /// Fails when the queue store cannot answer.
    async fn ping(&self) -> Result<(), ServiceError>;
}
