use crate::{
    config::Config,
    di::{DependenciesInject, DependenciesInjectDeps},
    health::HealthState,
    metrics::ProcessorMetrics,
    poller::{OrderPoller, OrderPollerDeps, PollerStatus},
};
use anyhow::{Context, Result};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::DynEventPublisher,
    config::{ConnectionPool, Kafka},
    utils::{SystemMetrics, run_metrics_collector},
};
use std::{fmt, sync::Arc};
use tracing::info;

pub struct AppState {
    pub di_container: DependenciesInject,
    pub registry: Arc<Registry>,
    pub status: Arc<PollerStatus>,
    pub metrics: ProcessorMetrics,
    pub system_metrics: Arc<SystemMetrics>,
    config: Config,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("deps", &self.di_container)
            .field("status", &self.status)
            .field("system_metrics", &self.system_metrics)
            .finish()
    }
}

impl AppState {
    pub fn new(pool: ConnectionPool, config: Config) -> Result<Self> {
        let mut registry = Registry::default();
        let system_metrics = Arc::new(SystemMetrics::new());
        let metrics = ProcessorMetrics::new();

        let publisher = match &config.kafka_broker {
            Some(brokers) => {
                let kafka = Kafka::new(brokers).context("Failed to create Kafka producer")?;
                Some(Arc::new(kafka) as DynEventPublisher)
            }
            None => {
                info!("KAFKA not set, order events will not be published");
                None
            }
        };

        let di_container = DependenciesInject::new(
            DependenciesInjectDeps {
                pool,
                queue: config.queue.clone(),
                publisher,
            },
            &mut registry,
        );

        metrics.register(&mut registry);
        system_metrics.register(&mut registry);

        tokio::spawn(run_metrics_collector(system_metrics.clone()));

        Ok(Self {
            di_container,
            registry: Arc::new(registry),
            status: Arc::new(PollerStatus::new(config.circuit_breaker)),
            metrics,
            system_metrics,
            config,
        })
    }

    pub fn poller(&self) -> OrderPoller {
        OrderPoller::new(OrderPollerDeps {
            queue: self.di_container.queue.clone(),
            service: self.di_container.order_processing.clone(),
            status: self.status.clone(),
            metrics: self.metrics.clone(),
            poll: self.config.poll,
        })
    }

    pub fn health_state(&self) -> HealthState {
        HealthState {
            status: self.status.clone(),
            registry: self.registry.clone(),
        }
    }
}
