use crate::{
    abstract_trait::DynQueueService, domain::response::RedriveResponse,
    middleware::jwt::auth_middleware, state::AppState,
};
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use shared::{
    domain::{ApiResponse, QueueDepth},
    errors::HttpError,
};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

#[utoipa::path(
    get,
    path = "/api/queue/stats",
    tag = "Queue",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Approximate queue depth", body = ApiResponse<QueueDepth>),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Order queue unavailable")
    )
)]
pub async fn get_queue_stats(
    Extension(service): Extension<DynQueueService>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.stats().await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/queue/dead-letter/redrive",
    tag = "Queue",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dead-lettered messages moved back", body = ApiResponse<RedriveResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Order queue unavailable")
    )
)]
pub async fn redrive_dead_letters(
    Extension(service): Extension<DynQueueService>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.redrive_dead_letters().await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn queue_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/queue/stats", get(get_queue_stats))
        .route("/api/queue/dead-letter/redrive", post(redrive_dead_letters))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(app_state.di_container.queue_service.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
