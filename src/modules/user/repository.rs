use uuid::Uuid;

use crate::{api::error, modules::user::schema::UserEntity};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn exists(&self, id: &Uuid) -> Result<bool, error::SystemError>;

    /// Stores an already-normalized signature; `None` when the user is unknown.
    async fn update_signature(
        &self,
        id: &Uuid,
        signature: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;
}
