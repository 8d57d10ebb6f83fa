use sqlx::FromRow;

/// Failed login counter per (user, ip). `user_id` is `None` when the
/// username did not match any account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct FailedAttempt {
    pub id: i32,
    pub user_id: Option<i32>,
    pub ip: String,
    pub attempts: i32,
}
