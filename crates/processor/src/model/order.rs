use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i32,
    pub order_id: Uuid,
    pub user_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub ordered_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
