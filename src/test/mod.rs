//! In-memory repositories for service tests.
//!
//! `MemoryStore` implements every repository trait over one mutex-guarded
//! state and routes its writes through the same `rules` functions as the
//! Postgres repositories. Timestamps come from a private clock that only
//! moves forward, one microsecond per write, so `updated_at` behaves like the
//! storage trigger without depending on wall-clock resolution.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        graph::{
            repository::GraphRepository,
            schema::{GraphRows, PendingRequestRow, StateSnapshot},
        },
        relationship::{
            model::NewRequest,
            repository::{RelationshipRepo, RelationshipRepository, RequestRepository},
            rules::{self, EdgeKey},
            schema::{RelationType, RelationshipEntity, RequestEntity, RequestStatus},
        },
        user::{repository::UserRepository, schema::UserEntity},
    },
};

struct MemoryState {
    clock: DateTime<Utc>,
    users: Vec<UserEntity>,
    relationships: Vec<RelationshipEntity>,
    requests: Vec<RequestEntity>,
}

impl MemoryState {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += chrono::Duration::microseconds(1);
        self.clock
    }

    fn pair_pending(&self, a: &Uuid, b: &Uuid) -> bool {
        self.requests.iter().any(|r| {
            r.status == RequestStatus::Pending
                && ((r.from_id == *a && r.to_id == *b) || (r.from_id == *b && r.to_id == *a))
        })
    }

    fn pair_active(&self, a: &Uuid, b: &Uuid) -> Vec<RelationshipEntity> {
        self.relationships.iter().filter(|e| e.is_active() && e.connects(a, b)).cloned().collect()
    }

    fn apply_edge(&mut self, key: &EdgeKey) {
        let now = self.tick();

        for edge in self.relationships.iter_mut() {
            if rules::is_superseded_by(edge, key) {
                edge.deleted_at = Some(now);
                edge.updated_at = now;
            }
        }

        match self.relationships.iter_mut().find(|e| key.matches(e)) {
            Some(edge) => {
                edge.deleted_at = None;
                edge.updated_at = now;
            }
            None => self.relationships.push(RelationshipEntity {
                id: Uuid::now_v7(),
                from_id: key.from_id,
                to_id: key.to_id,
                rel_type: key.rel_type,
                last_msg_id: 0,
                last_msg_time: None,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            }),
        }
    }
}

pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let clock = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        MemoryStore {
            state: Mutex::new(MemoryState {
                clock,
                users: Vec::new(),
                relationships: Vec::new(),
                requests: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let mut state = self.lock();
        let now = state.tick();
        let id = Uuid::now_v7();
        state.users.push(UserEntity {
            id,
            username: username.to_string(),
            real_name: username.to_uppercase(),
            avatar: "0.png".to_string(),
            signature: None,
            updated_at: now,
        });
        id
    }

    /// Moves the store clock forward, as if time passed between writes.
    pub fn advance(&self, by: chrono::Duration) {
        self.lock().clock += by;
    }

    pub fn user(&self, id: &Uuid) -> Option<UserEntity> {
        self.lock().users.iter().find(|u| u.id == *id).cloned()
    }

    pub fn request(&self, id: &Uuid) -> Option<RequestEntity> {
        self.lock().requests.iter().find(|r| r.id == *id).cloned()
    }

    pub fn requests(&self) -> Vec<RequestEntity> {
        self.lock().requests.clone()
    }

    pub fn all_edges(&self) -> Vec<RelationshipEntity> {
        self.lock().relationships.clone()
    }

    pub fn active_edges(&self) -> Vec<RelationshipEntity> {
        self.lock().relationships.iter().filter(|e| e.is_active()).cloned().collect()
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn exists(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        Ok(self.lock().users.iter().any(|u| u.id == *id))
    }

    async fn update_signature(
        &self,
        id: &Uuid,
        signature: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let mut state = self.lock();
        let now = state.tick();
        let Some(user) = state.users.iter_mut().find(|u| u.id == *id) else {
            return Ok(None);
        };
        user.signature = Some(signature.to_string());
        user.updated_at = now;
        Ok(Some(user.clone()))
    }
}

#[async_trait::async_trait]
impl RelationshipRepository for MemoryStore {
    async fn find_pair_active(
        &self,
        a: &Uuid,
        b: &Uuid,
    ) -> Result<Vec<RelationshipEntity>, error::SystemError> {
        Ok(self.lock().pair_active(a, b))
    }
}

#[async_trait::async_trait]
impl RequestRepository for MemoryStore {
    async fn find_pending_request(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<Option<RequestEntity>, error::SystemError> {
        let found = self
            .lock()
            .requests
            .iter()
            .find(|r| r.id == *request_id && r.to_id == *recipient_id && r.status == RequestStatus::Pending)
            .cloned();

        // Let a concurrent caller read the same precondition before either writes.
        tokio::task::yield_now().await;

        Ok(found)
    }

    async fn reject_request(
        &self,
        request_id: &Uuid,
        recipient_id: &Uuid,
    ) -> Result<u64, error::SystemError> {
        let mut state = self.lock();
        let now = state.tick();
        let Some(request) = state.requests.iter_mut().find(|r| {
            r.id == *request_id && r.to_id == *recipient_id && r.status == RequestStatus::Pending
        }) else {
            return Ok(0);
        };
        request.status = RequestStatus::Rejected;
        request.updated_at = now;
        Ok(1)
    }
}

#[async_trait::async_trait]
impl RelationshipRepo for MemoryStore {
    async fn create_request_atomic(
        &self,
        request: &NewRequest,
    ) -> Result<RequestEntity, error::SystemError> {
        let mut state = self.lock();

        let pair = state.pair_active(&request.from_id, &request.to_id);
        rules::ensure_proposal_allowed(&pair, &request.from_id, request.rel_type, request.is_update)?;

        if state.pair_pending(&request.from_id, &request.to_id) {
            return Err(error::SystemError::conflict("Request pending"));
        }

        let now = state.tick();
        let created = RequestEntity {
            id: Uuid::now_v7(),
            from_id: request.from_id,
            to_id: request.to_id,
            rel_type: request.rel_type,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.requests.push(created.clone());

        Ok(created)
    }

    async fn accept_request_atomic(
        &self,
        request: &RequestEntity,
    ) -> Result<(), error::SystemError> {
        let mut state = self.lock();
        let now = state.tick();

        let Some(stored) =
            state.requests.iter_mut().find(|r| r.id == request.id && r.to_id == request.to_id)
        else {
            return Err(error::SystemError::not_found("Request not found"));
        };
        match stored.status {
            RequestStatus::Pending => {}
            RequestStatus::Accepted => return Ok(()),
            RequestStatus::Rejected => return Err(error::SystemError::not_found("Request not found")),
        }
        stored.status = RequestStatus::Accepted;
        stored.updated_at = now;

        state.apply_edge(&EdgeKey::new(request.rel_type, request.from_id, request.to_id));

        Ok(())
    }

    async fn create_relationship_atomic(
        &self,
        from_id: &Uuid,
        to_id: &Uuid,
        rel_type: RelationType,
    ) -> Result<(), error::SystemError> {
        self.lock().apply_edge(&EdgeKey::new(rel_type, *from_id, *to_id));
        Ok(())
    }

    async fn remove_relationship_atomic(
        &self,
        user_id: &Uuid,
        peer_id: &Uuid,
    ) -> Result<Vec<RelationshipEntity>, error::SystemError> {
        let mut state = self.lock();

        let pair = state.pair_active(user_id, peer_id);
        let ids = rules::removable_edges(&pair, user_id);
        if ids.is_empty() {
            return Err(error::SystemError::not_found("No removable relationship found"));
        }

        let now = state.tick();
        let mut retired = Vec::new();
        for edge in state.relationships.iter_mut().filter(|e| ids.contains(&e.id)) {
            edge.deleted_at = Some(now);
            edge.updated_at = now;
            retired.push(edge.clone());
        }

        for request in state.requests.iter_mut() {
            let same_pair = (request.from_id == *user_id && request.to_id == *peer_id)
                || (request.from_id == *peer_id && request.to_id == *user_id);
            if same_pair && request.status == RequestStatus::Accepted {
                request.status = RequestStatus::Rejected;
                request.updated_at = now;
            }
        }

        Ok(retired)
    }
}

fn max_updated<'a>(stamps: impl Iterator<Item = &'a DateTime<Utc>>) -> Option<DateTime<Utc>> {
    stamps.max().copied()
}

impl MemoryState {
    fn snapshot(&self, viewer_id: &Uuid) -> StateSnapshot {
        let pending: Vec<&RequestEntity> = self
            .requests
            .iter()
            .filter(|r| r.to_id == *viewer_id && r.status == RequestStatus::Pending)
            .collect();

        StateSnapshot {
            users_max: max_updated(self.users.iter().map(|u| &u.updated_at)),
            relationships_max: max_updated(self.relationships.iter().map(|e| &e.updated_at)),
            pending_max: max_updated(pending.iter().map(|r| &r.updated_at)),
            pending_count: pending.len() as i64,
        }
    }
}

#[async_trait::async_trait]
impl GraphRepository for MemoryStore {
    async fn state_snapshot(&self, viewer_id: &Uuid) -> Result<StateSnapshot, error::SystemError> {
        Ok(self.lock().snapshot(viewer_id))
    }

    async fn load_graph(
        &self,
        viewer_id: &Uuid,
        changed_after: Option<DateTime<Utc>>,
    ) -> Result<GraphRows, error::SystemError> {
        let state = self.lock();

        let users = state
            .users
            .iter()
            .filter(|u| match changed_after {
                Some(since) => u.updated_at > since,
                None => true,
            })
            .cloned()
            .collect();

        let relationships = state
            .relationships
            .iter()
            .filter(|e| match changed_after {
                Some(since) => e.updated_at > since,
                None => e.is_active(),
            })
            .cloned()
            .collect();

        let mut requests: Vec<PendingRequestRow> = state
            .requests
            .iter()
            .filter(|r| r.to_id == *viewer_id && r.status == RequestStatus::Pending)
            .filter_map(|r| {
                let sender = state.users.iter().find(|u| u.id == r.from_id)?;
                Some(PendingRequestRow {
                    id: r.id,
                    from_id: r.from_id,
                    rel_type: r.rel_type,
                    username: sender.username.clone(),
                    updated_at: r.updated_at,
                })
            })
            .collect();
        requests.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(GraphRows { snapshot: state.snapshot(viewer_id), users, relationships, requests })
    }
}
