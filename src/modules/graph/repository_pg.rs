use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        graph::{
            repository::GraphRepository,
            schema::{GraphRows, PendingRequestRow, StateSnapshot},
        },
        relationship::schema::{RelationshipEntity, RequestStatus},
        user::schema::UserEntity,
    },
};

const STATE_SNAPSHOT_QUERY: &str = r#"
    SELECT
        (SELECT MAX(updated_at) FROM users) AS users_max,
        (SELECT MAX(updated_at) FROM relationships) AS relationships_max,
        (SELECT MAX(updated_at) FROM requests WHERE to_id = $1 AND status = $2) AS pending_max,
        (SELECT COUNT(*) FROM requests WHERE to_id = $1 AND status = $2) AS pending_count
"#;

#[derive(Clone)]
pub struct GraphRepositoryPg {
    pool: sqlx::PgPool,
}

impl GraphRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl GraphRepository for GraphRepositoryPg {
    async fn state_snapshot(&self, viewer_id: &Uuid) -> Result<StateSnapshot, error::SystemError> {
        let snapshot = sqlx::query_as::<_, StateSnapshot>(STATE_SNAPSHOT_QUERY)
            .bind(viewer_id)
            .bind(RequestStatus::Pending)
            .fetch_one(&self.pool)
            .await?;

        Ok(snapshot)
    }

    async fn load_graph(
        &self,
        viewer_id: &Uuid,
        changed_after: Option<DateTime<Utc>>,
    ) -> Result<GraphRows, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // Token and rows must describe the same snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let snapshot = sqlx::query_as::<_, StateSnapshot>(STATE_SNAPSHOT_QUERY)
            .bind(viewer_id)
            .bind(RequestStatus::Pending)
            .fetch_one(&mut *tx)
            .await?;

        let (users, relationships) = match changed_after {
            Some(since) => {
                let users = sqlx::query_as::<_, UserEntity>(
                    "SELECT * FROM users WHERE updated_at > $1 ORDER BY created_at",
                )
                .bind(since)
                .fetch_all(&mut *tx)
                .await?;

                let relationships = sqlx::query_as::<_, RelationshipEntity>(
                    "SELECT * FROM relationships WHERE updated_at > $1 ORDER BY updated_at",
                )
                .bind(since)
                .fetch_all(&mut *tx)
                .await?;

                (users, relationships)
            }
            None => {
                let users =
                    sqlx::query_as::<_, UserEntity>("SELECT * FROM users ORDER BY created_at")
                        .fetch_all(&mut *tx)
                        .await?;

                let relationships = sqlx::query_as::<_, RelationshipEntity>(
                    "SELECT * FROM relationships WHERE deleted_at IS NULL ORDER BY updated_at",
                )
                .fetch_all(&mut *tx)
                .await?;

                (users, relationships)
            }
        };

        let requests = sqlx::query_as::<_, PendingRequestRow>(
            r#"
            SELECT r.id, r.from_id, r.type, u.username, r.updated_at
            FROM requests r
            JOIN users u ON u.id = r.from_id
            WHERE r.to_id = $1 AND r.status = $2
            ORDER BY r.updated_at DESC
            "#,
        )
        .bind(viewer_id)
        .bind(RequestStatus::Pending)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(GraphRows { snapshot, users, relationships, requests })
    }
}
