use async_trait::async_trait;
use content_feed::{
    BaseViewStore, ContentId, ContentType, FeedError, IncrementAttempt, Result as FeedResult,
};
use sqlx::PgPool;

/// SQLSTATEs Postgres raises when a concurrent transaction wins.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// View counters stored in `view_counters`.
///
/// Every increment is a single `UPDATE ... SET count = count + 1 ... RETURNING`
/// so the database row lock serializes concurrent writers.
#[derive(Clone)]
pub struct PgViewStore {
    pool: PgPool,
}

impl PgViewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseViewStore for PgViewStore {
    async fn try_increment(
        &self,
        content_type: ContentType,
        owner_id: ContentId,
    ) -> FeedResult<IncrementAttempt> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE view_counters vc
            SET count = vc.count + 1, updated_at = NOW()
            FROM content_items ci
            WHERE vc.owner_id = $1
              AND ci.id = vc.owner_id
              AND ci.content_type = $2
            RETURNING vc.count
            "#,
        )
        .bind(owner_id)
        .bind(content_type)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(count)) => Ok(IncrementAttempt::Applied(count.max(0) as u64)),
            Ok(None) => Ok(IncrementAttempt::Missing),
            Err(e) if is_write_conflict(&e) => {
                tracing::debug!(%owner_id, error = %e, "view increment conflicted");
                Ok(IncrementAttempt::Conflict)
            }
            Err(e) => Err(FeedError::transient(e)),
        }
    }

    async fn current(
        &self,
        content_type: ContentType,
        owner_id: ContentId,
    ) -> FeedResult<Option<u64>> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT vc.count
            FROM view_counters vc
            JOIN content_items ci ON ci.id = vc.owner_id
            WHERE vc.owner_id = $1 AND ci.content_type = $2
            "#,
        )
        .bind(owner_id)
        .bind(content_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(FeedError::transient)?;

        Ok(count.map(|count| count.max(0) as u64))
    }
}

fn is_write_conflict(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == SERIALIZATION_FAILURE || code == DEADLOCK_DETECTED)
}
