//! Canonicalization and legality rules for relationship writes.
//!
//! Everything here is pure. The Postgres repository and the in-memory store
//! both call into these functions so every write path agrees on storage
//! orientation and on which edges a write retires.
use uuid::Uuid;

use crate::{
    api::error,
    modules::relationship::schema::{RelationType, RelationshipEntity},
};

/// Natural uniqueness key of an edge after canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub rel_type: RelationType,
}

impl EdgeKey {
    pub fn new(rel_type: RelationType, a: Uuid, b: Uuid) -> Self {
        let (from_id, to_id) = normalize(rel_type, a, b);
        EdgeKey { from_id, to_id, rel_type }
    }

    pub fn matches(&self, edge: &RelationshipEntity) -> bool {
        edge.from_id == self.from_id && edge.to_id == self.to_id && edge.rel_type == self.rel_type
    }
}

pub fn is_directed(rel_type: RelationType) -> bool {
    rel_type.is_directed()
}

/// Storage orientation of `(a, b)` for `rel_type`. Directed types keep the
/// caller's direction, undirected types are stored as `(min, max)`.
pub fn normalize(rel_type: RelationType, a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if is_directed(rel_type) {
        return (a, b);
    }
    if a < b { (a, b) } else { (b, a) }
}

pub fn validate_pair(user_id: &Uuid, peer_id: &Uuid) -> Result<(), error::SystemError> {
    if user_id.is_nil() || peer_id.is_nil() || user_id == peer_id {
        return Err(error::SystemError::invalid_parameters("Invalid parameters"));
    }
    Ok(())
}

/// Checks a proposal against the pair's active edges.
///
/// A fresh proposal is refused when the caller already holds an outgoing edge
/// of the same type, or when an undirected type is proposed while any
/// undirected edge connects the pair. An update needs something to update:
/// an outgoing CRUSH from the caller or any undirected edge.
pub fn ensure_proposal_allowed(
    pair_edges: &[RelationshipEntity],
    user_id: &Uuid,
    rel_type: RelationType,
    is_update: bool,
) -> Result<(), error::SystemError> {
    let active = pair_edges.iter().filter(|e| e.is_active());

    let mut has_undirected = false;
    let mut has_outgoing_directed = false;
    let mut has_outgoing_same_type = false;

    for edge in active {
        if !is_directed(edge.rel_type) {
            has_undirected = true;
        }
        if edge.from_id == *user_id && is_directed(edge.rel_type) {
            has_outgoing_directed = true;
        }
        if edge.from_id == *user_id && edge.rel_type == rel_type {
            has_outgoing_same_type = true;
        }
    }

    if is_update {
        if !(has_outgoing_directed || has_undirected) {
            return Err(error::SystemError::not_found("No active relationship to update"));
        }
        return Ok(());
    }

    if has_outgoing_same_type || (!is_directed(rel_type) && has_undirected) {
        return Err(error::SystemError::conflict("Relationship already exists"));
    }

    Ok(())
}

/// Types that an accepted `rel_type` edge retires between the same pair.
///
/// CRUSH retires the undirected relationship. An undirected type retires
/// every CRUSH plus any other undirected type, keeping undirected types
/// mutually exclusive per pair.
pub fn superseded_types(rel_type: RelationType) -> Vec<RelationType> {
    RelationType::ALL
        .into_iter()
        .filter(|t| {
            if is_directed(rel_type) { !is_directed(*t) } else { *t != rel_type }
        })
        .collect()
}

pub fn is_superseded_by(edge: &RelationshipEntity, incoming: &EdgeKey) -> bool {
    edge.is_active()
        && edge.connects(&incoming.from_id, &incoming.to_id)
        && !incoming.matches(edge)
        && superseded_types(incoming.rel_type).contains(&edge.rel_type)
}

/// Ids of the active edges `user_id` may retire from `pair_edges`.
///
/// Undirected edges are removable by either participant. Directed edges the
/// caller sent are removed and the peer's reciprocal edge is left alone;
/// when the caller holds nothing of their own, crushes aimed at them go.
pub fn removable_edges(pair_edges: &[RelationshipEntity], user_id: &Uuid) -> Vec<Uuid> {
    let active: Vec<&RelationshipEntity> = pair_edges.iter().filter(|e| e.is_active()).collect();

    let owned: Vec<Uuid> = active
        .iter()
        .filter(|e| !is_directed(e.rel_type) || e.from_id == *user_id)
        .map(|e| e.id)
        .collect();

    if !owned.is_empty() {
        return owned;
    }

    active
        .iter()
        .filter(|e| is_directed(e.rel_type) && e.to_id == *user_id)
        .map(|e| e.id)
        .collect()
}
