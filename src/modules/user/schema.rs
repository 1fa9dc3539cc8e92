use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub username: String,
    pub real_name: String,
    pub avatar: String,
    pub signature: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
