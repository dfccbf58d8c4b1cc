use crate::{
    abstract_trait::{DynOrderCommandRepository, OrderProcessingServiceTrait},
    domain::requests::CreateOrderRecordRequest,
    model::Order as OrderModel,
};
use shared::{
    abstract_trait::DynEventPublisher,
    domain::{OrderEvent, OrderMessage},
    errors::ServiceError,
    utils::{Method, Metrics, Status as StatusUtils, TracingContext},
};

use async_trait::async_trait;
use opentelemetry::{
    Context, KeyValue,
    global::{self, BoxedTracer},
    trace::{Span, SpanKind, TraceContextExt, Tracer},
};
use prometheus_client::registry::Registry;
use tokio::time::Instant;
use tracing::{error, info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct OrderProcessingService {
    command: DynOrderCommandRepository,
    publisher: Option<DynEventPublisher>,
    metrics: Metrics,
}

pub struct OrderProcessingServiceDeps {
    pub command: DynOrderCommandRepository,
    pub publisher: Option<DynEventPublisher>,
}

impl OrderProcessingService {
    pub fn new(deps: OrderProcessingServiceDeps, registry: &mut Registry) -> Self {
        let OrderProcessingServiceDeps { command, publisher } = deps;

        let metrics = Metrics::new();
        metrics.register("order_processing_service", registry);

        Self {
            command,
            publisher,
            metrics,
        }
    }

    fn get_tracer(&self) -> BoxedTracer {
        global::tracer("order-processing-service")
    }

    fn start_tracing(&self, operation_name: &str, attributes: Vec<KeyValue>) -> TracingContext {
        let start_time = Instant::now();
        let tracer = self.get_tracer();
        let mut span = tracer
            .span_builder(operation_name.to_string())
            .with_kind(SpanKind::Consumer)
            .with_attributes(attributes)
            .start(&tracer);

        span.add_event(
            "Operation started",
            vec![KeyValue::new("operation", operation_name.to_string())],
        );

        let cx = Context::current_with_span(span);
        TracingContext { cx, start_time }
    }

    fn complete_tracing(&self, tracing_ctx: &TracingContext, is_success: bool, message: &str) {
        let status_str = if is_success { "SUCCESS" } else { "ERROR" };
        let status = if is_success {
            StatusUtils::Success
        } else {
            StatusUtils::Error
        };
        let elapsed = tracing_ctx.start_time.elapsed().as_secs_f64();

        tracing_ctx.cx.span().add_event(
            "Operation completed",
            vec![
                KeyValue::new("status", status_str),
                KeyValue::new("duration_secs", elapsed.to_string()),
                KeyValue::new("message", message.to_string()),
            ],
        );

        self.metrics.record(Method::Consume, status, elapsed);

        tracing_ctx.cx.span().end();
    }

    fn parse(body: &str) -> Result<OrderMessage, ServiceError> {
        let msg: OrderMessage = serde_json::from_str(body)
            .map_err(|e| ServiceError::InvalidPayload(format!("malformed order message: {e}")))?;

        msg.validate()?;
        Ok(msg)
    }

    async fn publish_created(&self, order: &OrderModel) {
        let Some(publisher) = &self.publisher else {
            return;
        };

        let event = OrderEvent::Created {
            order_id: order.order_id,
            record_id: order.id,
            user_id: order.user_id,
            product_id: order.product_id,
            quantity: order.quantity,
        };

        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("⚠️ Failed to serialize order event: {e}");
                return;
            }
        };

        if let Err(e) = publisher
            .publish(event.topic(), &event.key(), &payload)
            .await
        {
            warn!(
                "⚠️ Order {} stored but event publish failed: {e}",
                order.order_id
            );
        }
    }
}

#[async_trait]
impl OrderProcessingServiceTrait for OrderProcessingService {
    async fn process(&self, body: &str) -> Result<OrderModel, ServiceError> {
        let tracing_ctx = self.start_tracing(
            "ProcessOrder",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "process"),
            ],
        );

        let msg = match Self::parse(body) {
            Ok(msg) => msg,
            Err(e) => {
                error!("❌ Rejected order message: {e}");
                self.complete_tracing(&tracing_ctx, false, &e.to_string());
                return Err(e);
            }
        };

        tracing_ctx.cx.span().set_attribute(KeyValue::new(
            "order.id",
            msg.order_id.to_string(),
        ));

        let order = match self
            .command
            .create_order(&CreateOrderRecordRequest::from(&msg))
            .await
        {
            Ok(order) => order,
            Err(e) => {
                error!("❌ Failed to persist order {}: {e}", msg.order_id);
                self.complete_tracing(&tracing_ctx, false, &e.to_string());
                return Err(ServiceError::Repo(e));
            }
        };

        self.publish_created(&order).await;

        info!(
            "📦 Order {} processed (product {}, quantity {})",
            order.order_id, order.product_id, order.quantity
        );
        self.complete_tracing(&tracing_ctx, true, "Order processed successfully");

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstract_trait::OrderCommandRepositoryTrait;
    use chrono::Utc;
    use shared::{abstract_trait::EventPublisherTrait, errors::RepositoryError};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingRepo {
        inserted: Mutex<Vec<CreateOrderRecordRequest>>,
    }

    #[async_trait]
    impl OrderCommandRepositoryTrait for RecordingRepo {
        async fn create_order(
            &self,
            req: &CreateOrderRecordRequest,
        ) -> Result<OrderModel, RepositoryError> {
            let mut inserted = self.inserted.lock().unwrap();
            inserted.push(req.clone());
            Ok(OrderModel {
                id: inserted.len() as i32,
                order_id: req.order_id,
                user_id: req.user_id,
                product_id: req.product_id,
                quantity: req.quantity,
                ordered_at: req.ordered_at,
                created_at: Utc::now(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EventPublisherTrait for RecordingPublisher {
        async fn publish(&self, topic: &str, key: &str, _value: &[u8]) -> Result<(), ServiceError> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), key.to_string()));
            Err(ServiceError::Kafka("broker down".into()))
        }
    }

    fn service(
        repo: Arc<RecordingRepo>,
        publisher: Option<Arc<RecordingPublisher>>,
    ) -> OrderProcessingService {
        let mut registry = Registry::default();
        OrderProcessingService::new(
            OrderProcessingServiceDeps {
                command: repo,
                publisher: publisher.map(|p| p as DynEventPublisher),
            },
            &mut registry,
        )
    }

    #[tokio::test]
    async fn persists_valid_message() {
        let repo = Arc::new(RecordingRepo::default());
        let svc = service(repo.clone(), None);

        let msg = OrderMessage::new(1, 42, 3);
        let body = serde_json::to_string(&msg).unwrap();

        let order = svc.process(&body).await.unwrap();
        assert_eq!(order.order_id, msg.order_id);
        assert_eq!(order.quantity, 3);
        assert_eq!(repo.inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_payload() {
        let repo = Arc::new(RecordingRepo::default());
        let svc = service(repo.clone(), None);

        let err = svc.process("{not json").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidPayload(_)));
        assert!(repo.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn out_of_range_quantity_fails_validation() {
        let repo = Arc::new(RecordingRepo::default());
        let svc = service(repo.clone(), None);

        let body = serde_json::to_string(&OrderMessage::new(1, 42, 500)).unwrap();
        let err = svc.process(&body).await.unwrap_err();

        match err {
            ServiceError::Validation(fields) => {
                assert!(fields.iter().any(|f| f.starts_with("quantity")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(repo.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_processing() {
        let repo = Arc::new(RecordingRepo::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let svc = service(repo, Some(publisher.clone()));

        let msg = OrderMessage::new(5, 8, 1);
        let body = serde_json::to_string(&msg).unwrap();

        assert!(svc.process(&body).await.is_ok());

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "order.created");
        assert_eq!(published[0].1, msg.order_id.to_string());
    }

    #[tokio::test]
    async fn records_processing_under_the_consume_method() {
        let repo = Arc::new(RecordingRepo::default());
        let mut registry = Registry::default();
        let svc = OrderProcessingService::new(
            OrderProcessingServiceDeps {
                command: repo,
                publisher: None,
            },
            &mut registry,
        );

        let body = serde_json::to_string(&OrderMessage::new(1, 42, 3)).unwrap();
        svc.process(&body).await.unwrap();
        svc.process("{not json").await.unwrap_err();

        let mut out = String::new();
        prometheus_client::encoding::text::encode(&mut out, &registry).unwrap();
        assert!(out.contains("method=\"Consume\",status=\"Success\""));
        assert!(out.contains("method=\"Consume\",status=\"Error\""));
        assert!(!out.contains("method=\"Post\""));
    }
}
