use chrono::{DateTime, Utc};
use shared::domain::OrderMessage;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateOrderRecordRequest {
    pub order_id: Uuid,
    pub user_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub ordered_at: DateTime<Utc>,
}

impl From<&OrderMessage> for CreateOrderRecordRequest {
    fn from(msg: &OrderMessage) -> Self {
        Self {
            order_id: msg.order_id,
            user_id: msg.user_id,
            product_id: msg.product_id,
            quantity: msg.quantity,
            ordered_at: msg.timestamp,
        }
    }
}
