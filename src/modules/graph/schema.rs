use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::modules::{
    relationship::schema::{RelationType, RelationshipEntity},
    user::schema::UserEntity,
};

/// The aggregate state a viewer's change token is derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct StateSnapshot {
    pub users_max: Option<DateTime<Utc>>,
    pub relationships_max: Option<DateTime<Utc>>,
    pub pending_max: Option<DateTime<Utc>>,
    pub pending_count: i64,
}

fn token_part(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true)).unwrap_or_else(|| "0".to_string())
}

impl StateSnapshot {
    pub fn etag(&self, viewer: &Uuid) -> String {
        let material = format!(
            "{}|{}|{}|{}|{}",
            token_part(self.users_max),
            token_part(self.relationships_max),
            token_part(self.pending_max),
            self.pending_count,
            viewer
        );
        hex::encode(Sha256::digest(material.as_bytes()))
    }

    /// Cursor the client echoes back on its next incremental fetch.
    pub fn next_cursor(&self) -> Option<DateTime<Utc>> {
        self.users_max.max(self.relationships_max)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct PendingRequestRow {
    pub id: Uuid,
    pub from_id: Uuid,
    #[sqlx(rename = "type")]
    pub rel_type: RelationType,
    pub username: String,
    pub updated_at: DateTime<Utc>,
}

/// Everything one graph read returns, taken from a single read snapshot.
#[derive(Debug, Clone)]
pub struct GraphRows {
    pub snapshot: StateSnapshot,
    pub users: Vec<UserEntity>,
    pub relationships: Vec<RelationshipEntity>,
    pub requests: Vec<PendingRequestRow>,
}
