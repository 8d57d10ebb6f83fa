/// Session database operations
use super::{is_unique_violation, SessionRepository};
use crate::error::{AuthError, Result};
use crate::models::Session;
use async_trait::async_trait;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn find_active(&self, user_id: i32) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, user_id, token, ip, is_active
            FROM sessions
            WHERE user_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn insert_active(&self, user_id: i32, token: &str, ip: &str) -> Result<Session> {
        let result = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, token, ip, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, user_id, token, ip, is_active
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(ip)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(session) => Ok(session),
            // Lost the race against another login for the same user
            Err(err) if is_unique_violation(&err) => Err(AuthError::SessionConflict { user_id }),
            Err(err) => Err(err.into()),
        }
    }

    async fn replace_token(&self, user_id: i32, ip: &str, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET token = $1
            WHERE user_id = $2 AND is_active = TRUE AND ip = $3
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(ip)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
