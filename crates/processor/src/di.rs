use crate::{
    abstract_trait::{DynOrderCommandRepository, DynOrderProcessingService},
    repository::OrderCommandRepository,
    service::{OrderProcessingService, OrderProcessingServiceDeps},
};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::{DynEventPublisher, DynMessageQueue},
    config::{ConnectionPool, QueueConfig},
    queue::PostgresQueue,
};
use std::{fmt, sync::Arc};

#[derive(Clone)]
pub struct DependenciesInject {
    pub queue: DynMessageQueue,
    pub order_processing: DynOrderProcessingService,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("queue", &self.queue.queue_name())
            .field("order_processing", &"OrderProcessingService")
            .finish()
    }
}

pub struct DependenciesInjectDeps {
    pub pool: ConnectionPool,
    pub queue: QueueConfig,
    pub publisher: Option<DynEventPublisher>,
}

impl DependenciesInject {
    pub fn new(deps: DependenciesInjectDeps, registry: &mut Registry) -> Self {
        let DependenciesInjectDeps {
            pool,
            queue,
            publisher,
        } = deps;

        let queue: DynMessageQueue = Arc::new(PostgresQueue::new(pool.clone(), queue));

        let order_command: DynOrderCommandRepository =
            Arc::new(OrderCommandRepository::new(pool));

        let order_processing: DynOrderProcessingService = Arc::new(OrderProcessingService::new(
            OrderProcessingServiceDeps {
                command: order_command,
                publisher,
            },
            registry,
        ));

        Self {
            queue,
            order_processing,
        }
    }
}
