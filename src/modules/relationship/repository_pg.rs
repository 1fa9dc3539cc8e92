use sqlx::{Connection, PgConnection};
use uuid::Uuid;

use crate::{
    api::error,
    modules::relationship::{
        model::NewRequest,
        repository::{RelationshipRepo, RelationshipRepository, RequestRepository},
        rules::{self, EdgeKey},
        schema::{RelationType, RelationshipEntity, RequestEntity, RequestStatus},
    },
};

const EDGE_KEY_CONSTRAINT: &str = "relationships_from_to_type_key";
const PENDING_PAIR_CONSTRAINT: &str = "requests_pending_pair_key";

const PAIR_ACTIVE_QUERY: &str = r#"
    SELECT *
    FROM relationships
    WHERE deleted_at IS NULL
      AND ((from_id = $1 AND to_id = $2) OR (from_id = $2 AND to_id = $1))
"#;

const PAIR_ACTIVE_FOR_UPDATE_QUERY: &str = r#"
    SELECT *
    FROM relationships
    WHERE deleted_at IS NULL
      AND ((from_id = $1 AND to_id = $2) OR (from_id = $2 AND to_id = $1))
    FOR UPDATE
"#;

#[derive(Clone)]
pub struct RelationshipRepositoryPg {
    pool: sqlx::PgPool,
}

impl RelationshipRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

fn new_id() -> Uuid {
    Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext))
}

/// Insert-or-resurrect keyed on `(from_id, to_id, type)`.
///
/// Runs in a savepoint so a unique violation that still leaks through only
/// unwinds this statement; the row it collided with is the row we wanted.
async fn upsert_edge(conn: &mut PgConnection, key: &EdgeKey) -> Result<(), error::SystemError> {
    let mut savepoint = conn.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO relationships (id, from_id, to_id, type)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (from_id, to_id, type)
        DO UPDATE SET deleted_at = NULL
        "#,
    )
    .bind(new_id())
    .bind(key.from_id)
    .bind(key.to_id)
    .bind(key.rel_type)
    .execute(&mut *savepoint)
    .await;

    match result {
        Ok(_) => {
            savepoint.commit().await?;
            Ok(())
        }
        Err(err) => {
            let err = error::SystemError::from(err);
            if !err.is_race_on(EDGE_KEY_CONSTRAINT) {
                return Err(err);
            }
            savepoint.rollback().await?;
            tracing::debug!(
                "Edge {} -> {} ({}) already written by a concurrent acceptance",
                key.from_id,
                key.to_id,
                key.rel_type
            );
            Ok(())
        }
    }
}

/// Retires whatever the new edge supersedes, then upserts it.
async fn apply_edge(conn: &mut PgConnection, key: &EdgeKey) -> Result<(), error::SystemError> {
    let superseded = rules::superseded_types(key.rel_type);

    sqlx::query(
        r#"
        UPDATE relationships
        SET deleted_at = clock_timestamp()
        WHERE deleted_at IS NULL
          AND type = ANY($3)
          AND ((from_id = $1 AND to_id = $2) OR (from_id = $2 AND to_id = $1))
        "#,
    )
    .bind(key.from_id)
    .bind(key.to_id)
    .bind(superseded.as_slice())
    .execute(&mut *conn)
    .await?;

    upsert_edge(conn, key).await
}

#[async_trait::async_trait]
impl RelationshipRepository for RelationshipRepositoryPg {
    async fn find_pair_active(
        &self,
        a: &Uuid,
        b: &Uuid,
    ) -> Result<Vec<RelationshipEntity>, error::SystemError> {
        if a == b {
            return Ok(Vec::new());
        }

        let edges = sqlx::query_as::<_, RelationshipEntity>(PAIR_ACTIVE_QUERY)
            .bind(a)
            .bind(b)
            .fetch_all(&self.pool)
            .await?;

        Ok(edges)
    }
}

#[async_trait::async_trait]
impl RequestRepository for RelationshipRepositoryPg {
    async fn find_pending_request(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, RequestEntity>(
            "SELECT * FROM requests WHERE id = $1 AND to_id = $2 AND status = $3",
        )
        .bind(request_id)
        .bind(recipient_id)
        .bind(RequestStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn reject_request(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<u64, error::SystemError> {
        let rows = sqlx::query(
            "UPDATE requests SET status = $3 WHERE id = $1 AND to_id = $2 AND status = $4",
        )
        .bind(request_id)
        .bind(recipient_id)
        .bind(RequestStatus::Rejected)
        .bind(RequestStatus::Pending)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl RelationshipRepo for RelationshipRepositoryPg {
    async fn create_request_atomic(
        &self,
        request: &NewRequest,
    ) -> Result<RequestEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let pair = sqlx::query_as::<_, RelationshipEntity>(PAIR_ACTIVE_QUERY)
            .bind(request.from_id)
            .bind(request.to_id)
            .fetch_all(&mut *tx)
            .await?;

        rules::ensure_proposal_allowed(
            &pair,
            &request.from_id,
            request.rel_type,
            request.is_update,
        )?;

        let pending: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id
            FROM requests
            WHERE status = $3
              AND ((from_id = $1 AND to_id = $2) OR (from_id = $2 AND to_id = $1))
            LIMIT 1
            "#,
        )
        .bind(request.from_id)
        .bind(request.to_id)
        .bind(RequestStatus::Pending)
        .fetch_optional(&mut *tx)
        .await?;

        if pending.is_some() {
            return Err(error::SystemError::conflict("Request pending"));
        }

        // The partial unique index catches a proposal that raced past the check above.
        let created = sqlx::query_as::<_, RequestEntity>(
            r#"
            INSERT INTO requests (id, from_id, to_id, type)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new_id())
        .bind(request.from_id)
        .bind(request.to_id)
        .bind(request.rel_type)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match error::SystemError::from(err) {
            e if e.is_race_on(PENDING_PAIR_CONSTRAINT) => {
                error::SystemError::conflict("Request pending")
            }
            e => e,
        })?;

        tx.commit().await?;

        Ok(created)
    }

    async fn accept_request_atomic(
        &self,
        request: &RequestEntity,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "UPDATE requests SET status = $3 WHERE id = $1 AND to_id = $2 AND status = $4",
        )
        .bind(request.id)
        .bind(request.to_id)
        .bind(RequestStatus::Accepted)
        .bind(RequestStatus::Pending)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            let status: Option<RequestStatus> =
                sqlx::query_scalar("SELECT status FROM requests WHERE id = $1 AND to_id = $2")
                    .bind(request.id)
                    .bind(request.to_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            // Someone else accepted it first; their edge mutation is the one that counts.
            if status == Some(RequestStatus::Accepted) {
                tracing::debug!("Request {} was already accepted, nothing to apply", request.id);
                return Ok(());
            }
            return Err(error::SystemError::not_found("Request not found"));
        }

        let key = EdgeKey::new(request.rel_type, request.from_id, request.to_id);
        apply_edge(&mut *tx, &key).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn create_relationship_atomic(
        &self,
        from_id: &Uuid,
        to_id: &Uuid,
        rel_type: RelationType,
    ) -> Result<(), error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let key = EdgeKey::new(rel_type, *from_id, *to_id);
        apply_edge(&mut *tx, &key).await?;

        tx.commit().await?;

        Ok(())
    }

    async fn remove_relationship_atomic(
        &self,
        user_id: &Uuid,
        peer_id: &Uuid,
    ) -> Result<Vec<RelationshipEntity>, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        let pair = sqlx::query_as::<_, RelationshipEntity>(PAIR_ACTIVE_FOR_UPDATE_QUERY)
            .bind(user_id)
            .bind(peer_id)
            .fetch_all(&mut *tx)
            .await?;

        let ids = rules::removable_edges(&pair, user_id);
        if ids.is_empty() {
            return Err(error::SystemError::not_found("No removable relationship found"));
        }

        let retired = sqlx::query_as::<_, RelationshipEntity>(
            r#"
            UPDATE relationships
            SET deleted_at = clock_timestamp()
            WHERE id = ANY($1) AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE requests
            SET status = $3
            WHERE status = $4
              AND ((from_id = $1 AND to_id = $2) OR (from_id = $2 AND to_id = $1))
            "#,
        )
        .bind(user_id)
        .bind(peer_id)
        .bind(RequestStatus::Rejected)
        .bind(RequestStatus::Accepted)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(retired)
    }
}
