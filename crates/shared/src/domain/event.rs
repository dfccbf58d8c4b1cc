use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ORDER_CREATED_TOPIC: &str = "order.created";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum OrderEvent {
    Created {
        order_id: Uuid,
        record_id: i32,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    },
}

impl OrderEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            OrderEvent::Created { .. } => ORDER_CREATED_TOPIC,
        }
    }

    pub fn key(&self) -> String {
        match self {
            OrderEvent::Created { order_id, .. } => order_id.to_string(),
        }
    }
}
