use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        events::GraphEvents,
        graph::{
            model::{format_cursor, GraphView, SyncConfig},
            repository::GraphRepository,
            wait::{self, LongPollConfig, WaitOutcome},
        },
    },
};

#[derive(Clone)]
pub struct GraphService {
    repo: Arc<dyn GraphRepository + Send + Sync>,
    events: GraphEvents,
    sync: SyncConfig,
    long_poll: LongPollConfig,
}

impl GraphService {
    pub fn with_dependencies(
        repo: Arc<dyn GraphRepository + Send + Sync>,
        events: GraphEvents,
        sync: SyncConfig,
        long_poll: LongPollConfig,
    ) -> Self {
        tracing::info!(
            "GraphService initialized (buffer {} ms, long poll {:?})",
            sync.buffer_window.num_milliseconds(),
            long_poll.timeout
        );
        GraphService { repo, events, sync, long_poll }
    }

    fn ensure_viewer(viewer_id: &Uuid) -> Result<(), error::SystemError> {
        if viewer_id.is_nil() {
            return Err(error::SystemError::invalid_parameters("Invalid parameters"));
        }
        Ok(())
    }

    pub async fn current_etag(&self, viewer_id: Uuid) -> Result<String, error::SystemError> {
        Self::ensure_viewer(&viewer_id)?;
        let snapshot = self.repo.state_snapshot(&viewer_id).await?;
        Ok(snapshot.etag(&viewer_id))
    }

    /// Full view when `since` is `None`, otherwise the delta since the cursor
    /// widened by the buffer window.
    pub async fn build_view(
        &self,
        viewer_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<GraphView, error::SystemError> {
        Self::ensure_viewer(&viewer_id)?;

        let changed_after = since.map(|cursor| cursor - self.sync.buffer_window);
        let rows = self.repo.load_graph(&viewer_id, changed_after).await?;

        Ok(GraphView {
            etag: rows.snapshot.etag(&viewer_id),
            last_update: rows.snapshot.next_cursor().map(format_cursor),
            incremental: since.is_some(),
            current_user_id: viewer_id,
            nodes: rows.users.into_iter().map(Into::into).collect(),
            links: rows.relationships.into_iter().map(Into::into).collect(),
            requests: rows.requests.into_iter().map(Into::into).collect(),
        })
    }

    /// Holds until the viewer's token differs from `known_etag` or the
    /// long-poll timeout passes.
    pub async fn wait_for_change(
        &self,
        viewer_id: Uuid,
        known_etag: &str,
    ) -> Result<WaitOutcome, error::SystemError> {
        // Subscribe before the first check so no update slips in between.
        let updates = self.events.subscribe();
        wait::wait_for_change(&self.long_poll, updates, known_etag, move || {
            self.current_etag(viewer_id)
        })
        .await
    }
}
