/// Failed login counters
use super::FailedAttemptRepository;
use crate::error::Result;
use crate::models::FailedAttempt;
use async_trait::async_trait;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgFailedAttemptRepository {
    pool: PgPool,
}

impl PgFailedAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FailedAttemptRepository for PgFailedAttemptRepository {
    async fn record_failure(&self, user_id: Option<i32>, ip: &str) -> Result<FailedAttempt> {
        // Conflict target matches the expression index so anonymous
        // failures from one IP share a row.
        let attempt = sqlx::query_as::<_, FailedAttempt>(
            r#"
            INSERT INTO failed_attempts (user_id, ip, attempts)
            VALUES ($1, $2, 1)
            ON CONFLICT ((COALESCE(user_id, 0)), ip)
            DO UPDATE SET attempts = failed_attempts.attempts + 1
            RETURNING id, user_id, ip, attempts
            "#,
        )
        .bind(user_id)
        .bind(ip)
        .fetch_one(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn find(&self, user_id: Option<i32>, ip: &str) -> Result<Option<FailedAttempt>> {
        let attempt = sqlx::query_as::<_, FailedAttempt>(
            r#"
            SELECT id, user_id, ip, attempts
            FROM failed_attempts
            WHERE user_id IS NOT DISTINCT FROM $1 AND ip = $2
            "#,
        )
        .bind(user_id)
        .bind(ip)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }
}
