use serde::{Deserialize, Serialize};
use sqlx::prelude::{FromRow, Type};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(type_name = "relation_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Dating,
    BestFriend,
    Brother,
    Sister,
    Beefing,
    Crush,
}

impl RelationType {
    pub const ALL: [RelationType; 6] = [
        RelationType::Dating,
        RelationType::BestFriend,
        RelationType::Brother,
        RelationType::Sister,
        RelationType::Beefing,
        RelationType::Crush,
    ];

    /// Types whose direction carries meaning; each direction is its own edge.
    pub const DIRECTED: [RelationType; 1] = [RelationType::Crush];

    pub fn is_directed(self) -> bool {
        Self::DIRECTED.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Dating => "DATING",
            RelationType::BestFriend => "BEST_FRIEND",
            RelationType::Brother => "BROTHER",
            RelationType::Sister => "SISTER",
            RelationType::Beefing => "BEEFING",
            RelationType::Crush => "CRUSH",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(type_name = "request_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RelationshipEntity {
    pub id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub last_msg_id: i32,
    pub last_msg_time: Option<chrono::DateTime<chrono::Utc>>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl RelationshipEntity {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    pub fn connects(&self, a: &Uuid, b: &Uuid) -> bool {
        (self.from_id == *a && self.to_id == *b) || (self.from_id == *b && self.to_id == *a)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RequestEntity {
    pub id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
