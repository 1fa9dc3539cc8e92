use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::{
    graph::schema::PendingRequestRow,
    relationship::schema::{RelationType, RelationshipEntity},
    user::schema::UserEntity,
};

const DEFAULT_SIGNATURE: &str = "No gossip yet.";
const AVATAR_PREFIX: &str = "assets/";

#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Subtracted from the client's cursor so writes that became visible
    /// just after the cursor was taken are delivered again.
    pub buffer_window: chrono::Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig { buffer_window: chrono::Duration::milliseconds(2000) }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GraphQuery {
    pub user_id: Uuid,
    #[validate(length(max = 64))]
    pub last_update: Option<String>,
    pub wait: Option<bool>,
}

/// Parses a client cursor. Accepts RFC 3339 or `YYYY-MM-DD HH:MM:SS[.f]` in
/// UTC; anything else yields `None` and the caller falls back to a full view.
pub fn parse_cursor(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn format_cursor(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Lenient `If-None-Match`: strips a weak prefix and surrounding quotes.
pub fn parse_entity_tag(raw: &str) -> Option<String> {
    let tag = raw.trim();
    let tag = tag.strip_prefix("W/").unwrap_or(tag);
    let tag = tag.trim_matches('"').trim();
    if tag.is_empty() { None } else { Some(tag.to_string()) }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub avatar: String,
    pub signature: String,
    pub val: u32,
    pub last_msg_id: i32,
}

impl From<UserEntity> for GraphNode {
    fn from(user: UserEntity) -> Self {
        GraphNode {
            id: user.id,
            name: user.real_name,
            username: user.username,
            avatar: format!("{AVATAR_PREFIX}{}", user.avatar),
            signature: user.signature.unwrap_or_else(|| DEFAULT_SIGNATURE.to_string()),
            val: 1,
            last_msg_id: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphLink {
    pub source: Uuid,
    pub target: Uuid,
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub last_msg_id: i32,
    pub deleted: bool,
}

impl From<RelationshipEntity> for GraphLink {
    fn from(edge: RelationshipEntity) -> Self {
        GraphLink {
            source: edge.from_id,
            target: edge.to_id,
            rel_type: edge.rel_type,
            last_msg_id: edge.last_msg_id,
            deleted: edge.deleted_at.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequestView {
    pub id: Uuid,
    pub from_id: Uuid,
    #[serde(rename = "type")]
    pub rel_type: RelationType,
    pub username: String,
}

impl From<PendingRequestRow> for PendingRequestView {
    fn from(row: PendingRequestRow) -> Self {
        PendingRequestView { id: row.id, from_id: row.from_id, rel_type: row.rel_type, username: row.username }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub requests: Vec<PendingRequestView>,
    pub current_user_id: Uuid,
    pub last_update: Option<String>,
    pub incremental: bool,
    pub etag: String,
}
