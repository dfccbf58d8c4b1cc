use apigateway::{handler::AppRouter, state::AppState};
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use shared::{
    abstract_trait::{JwtServiceTrait, MessageQueueTrait},
    config::{JwtConfig, QueueConfig},
    domain::{OrderMessage, QueueDepth, ReceiveOptions, ReceivedMessage},
    errors::QueueError,
    queue::InMemoryQueue,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

const SECRET: &str = "gateway-test-secret";

fn token(user_id: i64, token_type: &str) -> String {
    JwtConfig::new(SECRET)
        .generate_token(user_id, token_type)
        .unwrap()
}

fn app(queue: Arc<dyn MessageQueueTrait + Send + Sync>) -> Router {
    AppRouter::build(AppState::with_queue(queue, SECRET))
}

fn order_request(body: Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/orders")
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(1, "access")))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn accepted_order_is_enqueued_for_the_token_user() {
    let queue = Arc::new(InMemoryQueue::new(QueueConfig::default()));
    let access = token(7, "access");

    let response = app(queue.clone())
        .oneshot(order_request(
            json!({ "productId": 42, "quantity": 3 }),
            Some(&access),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "queued");

    let received = queue
        .receive_messages(&ReceiveOptions::default())
        .await
        .unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(body["data"]["messageId"], json!(received[0].message_id));

    let msg: OrderMessage = serde_json::from_str(&received[0].body).unwrap();
    assert_eq!(msg.user_id, 7);
    assert_eq!(msg.product_id, 42);
    assert_eq!(msg.quantity, 3);
    assert_eq!(body["data"]["orderId"], json!(msg.order_id));
}

#[tokio::test]
async fn order_without_token_is_unauthorized() {
    let queue = Arc::new(InMemoryQueue::new(QueueConfig::default()));

    let response = app(queue.clone())
        .oneshot(order_request(json!({ "productId": 1, "quantity": 1 }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(queue.depth().await.unwrap(), QueueDepth::default());
}

#[tokio::test]
async fn refresh_token_is_not_accepted() {
    let queue = Arc::new(InMemoryQueue::new(QueueConfig::default()));
    let refresh = token(7, "refresh");

    let response = app(queue)
        .oneshot(order_request(
            json!({ "productId": 1, "quantity": 1 }),
            Some(&refresh),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["message"], "Access token required");
}

#[tokio::test]
async fn out_of_range_quantity_is_rejected_before_enqueue() {
    let queue = Arc::new(InMemoryQueue::new(QueueConfig::default()));
    let access = token(7, "access");

    for quantity in [0, 101] {
        let response = app(queue.clone())
            .oneshot(order_request(
                json!({ "productId": 1, "quantity": quantity }),
                Some(&access),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["status"], "fail");
        assert!(body["details"].get("quantity").is_some());
    }

    assert_eq!(queue.depth().await.unwrap().visible, 0);
}

#[tokio::test]
async fn stats_report_queue_depth() {
    let queue = Arc::new(InMemoryQueue::new(QueueConfig::default()));
    queue.send_message("{}").await.unwrap();
    queue.send_message("{}").await.unwrap();
    queue
        .receive_messages(&ReceiveOptions::default())
        .await
        .unwrap();

    let response = app(queue)
        .oneshot(authed("GET", "/api/queue/stats"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["visible"], 1);
    assert_eq!(body["data"]["in_flight"], 1);
    assert_eq!(body["data"]["dead_lettered"], 0);
}

#[tokio::test]
async fn redrive_moves_dead_letters_back() {
    let queue = Arc::new(InMemoryQueue::new(QueueConfig {
        max_receive_count: 1,
        ..QueueConfig::default()
    }));
    queue.send_message("{}").await.unwrap();

    let opts = ReceiveOptions {
        visibility_timeout: Some(Duration::ZERO),
        ..ReceiveOptions::default()
    };
    assert_eq!(queue.receive_messages(&opts).await.unwrap().len(), 1);
    assert!(queue.receive_messages(&opts).await.unwrap().is_empty());
    assert_eq!(queue.depth().await.unwrap().dead_lettered, 1);

    let response = app(queue.clone())
        .oneshot(authed("POST", "/api/queue/dead-letter/redrive"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["moved"], 1);

    let depth = queue.depth().await.unwrap();
    assert_eq!(depth.dead_lettered, 0);
    assert_eq!(depth.visible, 1);
}

#[tokio::test]
async fn health_is_ok_when_queue_is_reachable() {
    let queue = Arc::new(InMemoryQueue::new(QueueConfig::default()));

    let response = app(queue)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

struct UnavailableQueue;

fn outage() -> QueueError {
    QueueError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl MessageQueueTrait for UnavailableQueue {
    fn queue_name(&self) -> &str {
        "orders"
    }

    async fn send_message(&self, _body: &str) -> Result<String, QueueError> {
        Err(outage())
    }

    async fn receive_messages(
        &self,
        _opts: &ReceiveOptions,
    ) -> Result<Vec<ReceivedMessage>, QueueError> {
        Err(outage())
    }

    async fn delete_message(&self, _receipt_handle: &str) -> Result<(), QueueError> {
        Err(outage())
    }

    async fn change_visibility(
        &self,
        _receipt_handle: &str,
        _timeout: Duration,
    ) -> Result<(), QueueError> {
        Err(outage())
    }

    async fn depth(&self) -> Result<QueueDepth, QueueError> {
        Err(outage())
    }

    async fn redrive_dead_letters(&self) -> Result<u64, QueueError> {
        Err(outage())
    }
}

#[tokio::test]
async fn queue_outage_is_service_unavailable() {
    let access = token(7, "access");

    let response = app(Arc::new(UnavailableQueue))
        .oneshot(order_request(
            json!({ "productId": 1, "quantity": 1 }),
            Some(&access),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app(Arc::new(UnavailableQueue))
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn server_stops_when_shutdown_is_broadcast() {
    let queue = Arc::new(InMemoryQueue::new(QueueConfig::default()));
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    let server = tokio::spawn(AppRouter::serve(
        0,
        AppState::with_queue(queue, SECRET),
        shutdown_rx,
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).unwrap();

    let stopped = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop after shutdown")
        .unwrap();
    assert!(stopped.is_ok());
}
