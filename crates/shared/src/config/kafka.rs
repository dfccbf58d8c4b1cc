use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::{error, info};

use crate::abstract_trait::EventPublisherTrait;
use crate::errors::ServiceError;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Kafka {
    producer: FutureProducer,
}

impl Kafka {
    pub fn new(brokers: &str) -> Result<Self, ServiceError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "6000")
            .set("allow.auto.create.topics", "true")
            .create()
            .map_err(ServiceError::from)?;

        info!("Kafka producer connected successfully");
        Ok(Kafka { producer })
    }
}

#[async_trait]
impl EventPublisherTrait for Kafka {
    async fn publish(&self, topic: &str, key: &str, value: &[u8]) -> Result<(), ServiceError> {
        let record = FutureRecord::to(topic).key(key).payload(value);

        match self.producer.send(record, DELIVERY_TIMEOUT).await {
            Ok(_) => {
                info!(topic, key, "Message sent successfully");
                Ok(())
            }
            Err((kafka_error, _message)) => {
                error!(topic, key, "Failed to deliver message: {kafka_error}");
                Err(ServiceError::from(kafka_error))
            }
        }
    }
}
