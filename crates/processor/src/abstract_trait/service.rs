use crate::model::Order as OrderModel;
use async_trait::async_trait;
use shared::errors::ServiceError;
use std::sync::Arc;

pub type DynOrderProcessingService = Arc<dyn OrderProcessingServiceTrait + Send + Sync>;

/// Turns one raw queue message body into a persisted order.
#[async_trait]
pub trait OrderProcessingServiceTrait {
    async fn process(&self, body: &str) -> Result<OrderModel, ServiceError>;
}
