use crate::{
    abstract_trait::{DynOrderService, DynQueueService},
    service::{OrderService, QueueService},
};
use prometheus_client::registry::Registry;
use shared::abstract_trait::DynMessageQueue;
use std::sync::Arc;

#[derive(Clone)]
pub struct DependenciesInject {
    pub order_service: DynOrderService,
    pub queue_service: DynQueueService,
}

impl std::fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("order_service", &"DynOrderService")
            .field("queue_service", &"DynQueueService")
            .finish()
    }
}

impl DependenciesInject {
    pub fn new(queue: DynMessageQueue, registry: &mut Registry) -> Self {
        let order_service: DynOrderService =
            Arc::new(OrderService::new(queue.clone(), registry));

        let queue_service: DynQueueService = Arc::new(QueueService::new(queue));

        Self {
            order_service,
            queue_service,
        }
    }
}
