use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::graph::schema::{GraphRows, StateSnapshot},
};

#[async_trait::async_trait]
pub trait GraphRepository {
    /// Aggregate timestamps and the viewer's pending-request count.
    async fn state_snapshot(&self, viewer_id: &Uuid) -> Result<StateSnapshot, error::SystemError>;

    /// Reads the snapshot and the rows it describes from one consistent view.
    ///
    /// With `changed_after` set, users and edges (soft-deleted ones included)
    /// touched after it are returned; without it every user and every active
    /// edge. The viewer's pending requests are always returned in full.
    async fn load_graph(
        &self,
        viewer_id: &Uuid,
        changed_after: Option<DateTime<Utc>>,
    ) -> Result<GraphRows, error::SystemError>;
}
