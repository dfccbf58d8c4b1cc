use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::ServiceError;

pub type DynEventPublisher = Arc<dyn EventPublisherTrait + Send + Sync>;

#[async_trait]
pub trait EventPublisherTrait {
    async fn publish(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ServiceError>;
}
