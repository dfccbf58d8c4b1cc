use crate::{
    abstract_trait::OrderServiceTrait,
    domain::{requests::CreateOrderRequest, response::OrderQueuedResponse},
};
use async_trait::async_trait;
use opentelemetry::{
    Context, KeyValue,
    global::{self, BoxedTracer},
    trace::{Span, SpanKind, TraceContextExt, Tracer},
};
use prometheus_client::registry::Registry;
use shared::{
    abstract_trait::DynMessageQueue,
    domain::{ApiResponse, OrderMessage},
    errors::ServiceError,
    utils::{Method, Metrics, Status as StatusUtils, TracingContext},
};
use tokio::time::Instant;
use tracing::{error, info};
use validator::Validate;

#[derive(Clone)]
pub struct OrderService {
    queue: DynMessageQueue,
    metrics: Metrics,
}

impl OrderService {
    pub fn new(queue: DynMessageQueue, registry: &mut Registry) -> Self {
        let metrics = Metrics::new();
        metrics.register("order_service", registry);

        Self { queue, metrics }
    }

    fn get_tracer(&self) -> BoxedTracer {
        global::tracer("order-service")
    }

    fn start_tracing(&self, operation_name: &str, attributes: Vec<KeyValue>) -> TracingContext {
        let start_time = Instant::now();
        let tracer = self.get_tracer();
        let mut span = tracer
            .span_builder(operation_name.to_string())
            .with_kind(SpanKind::Producer)
            .with_attributes(attributes)
            .start(&tracer);

        info!("Starting operation: {operation_name}");

        span.add_event(
            "Operation started",
            vec![KeyValue::new("operation", operation_name.to_string())],
        );

        let cx = Context::current_with_span(span);
        TracingContext { cx, start_time }
    }

    fn complete_tracing(&self, tracing_ctx: &TracingContext, is_success: bool, message: &str) {
        let status = if is_success {
            StatusUtils::Success
        } else {
            StatusUtils::Error
        };
        let elapsed = tracing_ctx.start_time.elapsed().as_secs_f64();

        tracing_ctx.cx.span().add_event(
            "Operation completed",
            vec![
                KeyValue::new("status", if is_success { "SUCCESS" } else { "ERROR" }),
                KeyValue::new("duration_secs", elapsed.to_string()),
                KeyValue::new("message", message.to_string()),
            ],
        );

        self.metrics.record(Method::Post, status, elapsed);
        tracing_ctx.cx.span().end();
    }
}

#[async_trait]
impl OrderServiceTrait for OrderService {
    async fn submit_order(
        &self,
        user_id: i32,
        req: &CreateOrderRequest,
    ) -> Result<ApiResponse<OrderQueuedResponse>, ServiceError> {
        let msg = OrderMessage::new(user_id, req.product_id, req.quantity);

        let tracing_ctx = self.start_tracing(
            "SubmitOrder",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "submit"),
                KeyValue::new("order.id", msg.order_id.to_string()),
                KeyValue::new("queue", self.queue.queue_name().to_string()),
            ],
        );

        if let Err(e) = msg.validate() {
            let err = ServiceError::from(e);
            self.complete_tracing(&tracing_ctx, false, &err.to_string());
            return Err(err);
        }

        let body = match serde_json::to_string(&msg) {
            Ok(body) => body,
            Err(e) => {
                let err = ServiceError::Internal(format!("failed to encode order message: {e}"));
                self.complete_tracing(&tracing_ctx, false, &err.to_string());
                return Err(err);
            }
        };

        let message_id = match self.queue.send_message(&body).await {
            Ok(id) => id,
            Err(e) => {
                error!("❌ Failed to enqueue order {}: {e}", msg.order_id);
                self.complete_tracing(&tracing_ctx, false, &e.to_string());
                return Err(ServiceError::Queue(e));
            }
        };

        info!(
            "📨 Order {} queued for user {} as message {}",
            msg.order_id, user_id, message_id
        );
        self.complete_tracing(&tracing_ctx, true, "Order queued");

        Ok(ApiResponse::success(
            "Order accepted for processing",
            OrderQueuedResponse::queued(msg.order_id, message_id),
        ))
    }
}
