use sqlx::FromRow;

/// Login session; at most one active row per user
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Session {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
    pub ip: String,
    pub is_active: bool,
}
