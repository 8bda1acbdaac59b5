//! Subscription repository: read-only aggregates over the edge table

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{StoreError, StoreResult, SubscriptionStore};

/// Postgres subscription store. The service only ever reads this table; the
/// two counts are independent indexed aggregates, never a materialized join.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for SubscriptionRepository {
    async fn count_subscribers(&self, channel_id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM subscriptions
            WHERE channel_id = $1
            "#,
        )
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Other(e.into()))?;

        Ok(count)
    }

    async fn count_subscriptions(&self, subscriber_id: Uuid) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM subscriptions
            WHERE subscriber_id = $1
            "#,
        )
        .bind(subscriber_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Other(e.into()))?;

        Ok(count)
    }

    async fn is_subscribed(&self, subscriber_id: Uuid, channel_id: Uuid) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM subscriptions
                WHERE subscriber_id = $1 AND channel_id = $2
            )
            "#,
        )
        .bind(subscriber_id)
        .bind(channel_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Other(e.into()))?;

        Ok(exists)
    }
}
