use std::sync::Arc;

use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        events::GraphEvents,
        relationship::{
            model::NewRequest,
            repository::{RelationshipRepo, RelationshipRepository, RequestRepository},
            rules,
            schema::{RelationType, RequestEntity},
        },
        user::repository::UserRepository,
    },
};

/// Relationship state machine: proposals, acceptance, rejection, removal.
///
/// Legality is decided before any write; the repositories apply each
/// transition in a single transaction. Every successful transition announces
/// the affected users on `GraphEvents`.
#[derive(Clone)]
pub struct RelationshipService {
    relationship_repo: Arc<dyn RelationshipRepo>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    events: GraphEvents,
}

impl RelationshipService {
    pub fn with_dependencies(
        relationship_repo: Arc<dyn RelationshipRepo>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        events: GraphEvents,
    ) -> Self {
        tracing::info!("RelationshipService initialized with dependencies");
        RelationshipService { relationship_repo, user_repo, events }
    }

    async fn ensure_peer(&self, user_id: &Uuid, peer_id: &Uuid) -> Result<(), error::SystemError> {
        rules::validate_pair(user_id, peer_id)?;

        if !self.user_repo.exists(peer_id).await? {
            return Err(error::SystemError::not_found("Target user not found"));
        }

        Ok(())
    }

    pub async fn propose_relationship(
        &self,
        user_id: Uuid,
        peer_id: Uuid,
        rel_type: RelationType,
        is_update: bool,
    ) -> Result<RequestEntity, error::SystemError> {
        self.ensure_peer(&user_id, &peer_id).await?;

        // Cheap early answer; the repository re-checks inside its transaction.
        let pair = self.relationship_repo.find_pair_active(&user_id, &peer_id).await?;
        rules::ensure_proposal_allowed(&pair, &user_id, rel_type, is_update)?;

        let request = self
            .relationship_repo
            .create_request_atomic(&NewRequest { from_id: user_id, to_id: peer_id, rel_type, is_update })
            .await?;

        tracing::info!(
            "Request {} created: {} -> {} ({}, update: {})",
            request.id,
            user_id,
            peer_id,
            rel_type,
            is_update
        );
        self.events.notify_graph_changed(peer_id);

        Ok(request)
    }

    pub async fn accept_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let request = self
            .relationship_repo
            .find_pending_request(&request_id, &user_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Request not found"))?;

        self.relationship_repo.accept_request_atomic(&request).await?;

        tracing::info!(
            "Request {} accepted: {} -> {} ({})",
            request.id,
            request.from_id,
            request.to_id,
            request.rel_type
        );
        self.events.notify_graph_changed(request.from_id);
        self.events.notify_graph_changed(request.to_id);

        Ok(())
    }

    pub async fn reject_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let rows = self.relationship_repo.reject_request(&request_id, &user_id).await?;
        if rows == 0 {
            return Err(error::SystemError::not_found("Request not found"));
        }

        tracing::info!("Request {} rejected by {}", request_id, user_id);
        self.events.notify_graph_changed(user_id);

        Ok(())
    }

    pub async fn remove_relationship(
        &self,
        user_id: Uuid,
        peer_id: Uuid,
    ) -> Result<(), error::SystemError> {
        self.ensure_peer(&user_id, &peer_id).await?;

        let retired = self.relationship_repo.remove_relationship_atomic(&user_id, &peer_id).await?;

        tracing::info!(
            "{} removed {} relationship(s) with {}",
            user_id,
            retired.len(),
            peer_id
        );
        self.events.notify_graph_changed(user_id);
        self.events.notify_graph_changed(peer_id);

        Ok(())
    }

    /// Writes an edge directly, without a request. Used for seeding and
    /// imports; applies exactly the edge mutation an acceptance would.
    pub async fn create_relationship(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        rel_type: RelationType,
    ) -> Result<(), error::SystemError> {
        rules::validate_pair(&from_id, &to_id)?;

        let (from_exists, to_exists) =
            tokio::try_join!(self.user_repo.exists(&from_id), self.user_repo.exists(&to_id))?;
        if !from_exists || !to_exists {
            return Err(error::SystemError::not_found("Target user not found"));
        }

        self.relationship_repo.create_relationship_atomic(&from_id, &to_id, rel_type).await?;

        tracing::info!("Relationship created directly: {} -> {} ({})", from_id, to_id, rel_type);
        self.events.notify_graph_changed(from_id);
        self.events.notify_graph_changed(to_id);

        Ok(())
    }
}
