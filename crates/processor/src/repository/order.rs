use crate::{
    abstract_trait::OrderCommandRepositoryTrait, domain::requests::CreateOrderRecordRequest,
    model::Order as OrderModel,
};
use shared::{config::ConnectionPool, errors::RepositoryError};

use async_trait::async_trait;
use tracing::{error, info};

pub struct OrderCommandRepository {
    db: ConnectionPool,
}

impl OrderCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderCommandRepositoryTrait for OrderCommandRepository {
    async fn create_order(
        &self,
        req: &CreateOrderRecordRequest,
    ) -> Result<OrderModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query_as::<_, OrderModel>(
            r#"
            INSERT INTO orders (order_id, user_id, product_id, quantity, ordered_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, order_id, user_id, product_id, quantity, ordered_at, created_at
            "#,
        )
        .bind(req.order_id)
        .bind(req.user_id)
        .bind(req.product_id)
        .bind(req.quantity)
        .bind(req.ordered_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            error!(
                "❌ Failed to create order {} for user {}: {:?}",
                req.order_id, req.user_id, err
            );
            RepositoryError::from_insert(err)
        })?;

        info!(
            "✅ Created order record {} (order {}) for user {}",
            result.id, result.order_id, result.user_id
        );
        Ok(result)
    }
}
