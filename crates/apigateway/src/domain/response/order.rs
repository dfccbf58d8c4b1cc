use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const QUEUED_STATUS: &str = "queued";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderQueuedResponse {
    pub order_id: Uuid,
    pub message_id: String,
    pub status: String,
}

impl OrderQueuedResponse {
    pub fn queued(order_id: Uuid, message_id: String) -> Self {
        Self {
            order_id,
            message_id,
            status: QUEUED_STATUS.to_string(),
        }
    }
}
