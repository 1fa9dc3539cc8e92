use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::events::GraphEvents;
use crate::modules::user::model::normalize_signature;
use crate::modules::user::repository::UserRepository;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    events: GraphEvents,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        events: GraphEvents,
    ) -> Self {
        tracing::info!("UserService initialized with dependencies");
        UserService { repo, events }
    }

    /// Updates the user's signature and returns what was stored.
    ///
    /// The write bumps the user's `updated_at`, which changes every viewer's
    /// change token.
    pub async fn update_signature(
        &self,
        id: Uuid,
        signature: &str,
    ) -> Result<String, error::SystemError> {
        let normalized = normalize_signature(signature)
            .ok_or_else(|| error::SystemError::invalid_parameters("Signature cannot be empty."))?;

        let user = self
            .repo
            .update_signature(&id, &normalized)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found."))?;

        tracing::info!("User {} updated their signature", id);
        self.events.notify_graph_changed(id);

        Ok(user.signature.unwrap_or(normalized))
    }
}
