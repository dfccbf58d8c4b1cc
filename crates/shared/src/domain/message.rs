use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// The order as it travels through the queue, from the gateway to the
/// processor. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderMessage {
    pub order_id: Uuid,

    #[validate(range(min = 1))]
    pub user_id: i32,

    #[validate(range(min = 1))]
    pub product_id: i32,

    #[validate(range(min = 1, max = 100))]
    pub quantity: i32,

    pub timestamp: DateTime<Utc>,
}

impl OrderMessage {
    pub fn new(user_id: i32, product_id: i32, quantity: i32) -> Self {
        Self {
            order_id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_format_is_camel_case() {
        let msg = OrderMessage::new(7, 3, 2);
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["userId"], json!(7));
        assert_eq!(value["productId"], json!(3));
        assert_eq!(value["quantity"], json!(2));
        assert!(value.get("orderId").is_some());
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn parses_gateway_payload() {
        let raw = r#"{
            "orderId": "5f0c6a55-52a9-4f4e-9b0f-8f8d7c0d9a11",
            "userId": 1,
            "productId": 42,
            "quantity": 5,
            "timestamp": "2025-03-01T10:00:00Z"
        }"#;

        let msg: OrderMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.product_id, 42);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_quantity() {
        let mut msg = OrderMessage::new(1, 1, 0);
        assert!(msg.validate().is_err());

        msg.quantity = 101;
        assert!(msg.validate().is_err());

        msg.quantity = 100;
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn rejects_missing_user() {
        let msg = OrderMessage::new(0, 1, 1);
        let errors = msg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_id"));
    }
}
