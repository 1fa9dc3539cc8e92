use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::relationship::schema::{RelationType, RequestEntity, RequestStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRequestBody {
    pub user_id: Uuid,
    pub to_id: Uuid,
    #[serde(rename = "type")]
    pub rel_type: RelationType,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestDecisionBody {
    pub user_id: Uuid,
    pub request_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRelationshipBody {
    pub user_id: Uuid,
    pub to_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationshipBody {
    pub from_id: Uuid,
    pub to_id: Uuid,
    #[serde(rename = "type")]
    pub rel_type: RelationType,
}

/// A proposal as handed to the repository's guarded insert.
#[derive(Debug, Clone, Copy)]
pub struct NewRequest {
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub rel_type: RelationType,
    pub is_update: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub status: RequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<RequestEntity> for RequestResponse {
    fn from(entity: RequestEntity) -> Self {
        RequestResponse {
            id: entity.id,
            from_id: entity.from_id,
            to_id: entity.to_id,
            rel_type: entity.rel_type,
            status: entity.status,
            created_at: entity.created_at,
        }
    }
}
