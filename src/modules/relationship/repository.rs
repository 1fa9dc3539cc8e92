use uuid::Uuid;

use crate::api::error;
use crate::modules::relationship::model::NewRequest;
use crate::modules::relationship::schema::{RelationType, RelationshipEntity, RequestEntity};

#[async_trait::async_trait]
pub trait RelationshipRepository {
    /// Active edges between `a` and `b`, in either orientation.
    async fn find_pair_active(
        &self,
        a: &Uuid,
        b: &Uuid,
    ) -> Result<Vec<RelationshipEntity>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait RequestRepository {
    async fn find_pending_request(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError>;

    /// Marks a PENDING request addressed to `recipient_id` as REJECTED and
    /// returns the number of rows it touched.
    async fn reject_request(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<u64, error::SystemError>;
}

#[async_trait::async_trait]
pub trait RelationshipRepo: RelationshipRepository + RequestRepository + Send + Sync {
    /// Re-checks the proposal against the pair's active edges and the
    /// pending-request gate, then inserts a PENDING request, all in one
    /// transaction.
    async fn create_request_atomic(
        &self,
        request: &NewRequest,
    ) -> Result<RequestEntity, error::SystemError>;

    /// Moves `request` from PENDING to ACCEPTED and applies its edge mutation
    /// in one transaction. If it is already ACCEPTED the call succeeds without
    /// touching any edge; any other state is `NotFound`.
    async fn accept_request_atomic(
        &self,
        request: &RequestEntity,
    ) -> Result<(), error::SystemError>;

    /// Applies the acceptance edge mutation without a request.
    async fn create_relationship_atomic(
        &self,
        from_id: &Uuid,
        to_id: &Uuid,
        rel_type: RelationType,
    ) -> Result<(), error::SystemError>;

    /// Soft-deletes the edges `user_id` may remove from the pair and rejects
    /// the pair's ACCEPTED requests. Returns the retired edges.
    async fn remove_relationship_atomic(
        &self,
        user_id: &Uuid,
        peer_id: &Uuid,
    ) -> Result<Vec<RelationshipEntity>, error::SystemError>;
}
