use crate::di::DependenciesInject;
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::{DynJwtService, DynMessageQueue},
    config::{ConnectionPool, JwtConfig, QueueConfig},
    queue::PostgresQueue,
    utils::{SystemMetrics, run_metrics_collector},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jwt_config: DynJwtService,
    pub di_container: DependenciesInject,
    pub registry: Arc<Registry>,
    pub system_metrics: Arc<SystemMetrics>,
}

impl AppState {
    pub fn new(pool: ConnectionPool, queue: QueueConfig, jwt_secret: &str) -> Self {
        let queue: DynMessageQueue = Arc::new(PostgresQueue::new(pool, queue));
        let state = Self::with_queue(queue, jwt_secret);

        tokio::spawn(run_metrics_collector(state.system_metrics.clone()));

        state
    }

    /// Builds the state around any queue backend.
    pub fn with_queue(queue: DynMessageQueue, jwt_secret: &str) -> Self {
        let jwt_config = Arc::new(JwtConfig::new(jwt_secret)) as DynJwtService;
        let mut registry = Registry::default();
        let system_metrics = Arc::new(SystemMetrics::new());

        let di_container = DependenciesInject::new(queue, &mut registry);
        system_metrics.register(&mut registry);

        Self {
            jwt_config,
            di_container,
            registry: Arc::new(registry),
            system_metrics,
        }
    }
}
