use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Order submission body. The user is taken from the access token.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(range(min = 1, message = "productId must be a positive integer"))]
    pub product_id: i32,

    #[validate(range(min = 1, max = 100, message = "quantity must be between 1 and 100"))]
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_case_body() {
        let req: CreateOrderRequest =
            serde_json::from_str(r#"{"productId": 9, "quantity": 4}"#).unwrap();
        assert_eq!(req.product_id, 9);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_zero_product() {
        let req = CreateOrderRequest {
            product_id: 0,
            quantity: 1,
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("product_id"));
    }
}
