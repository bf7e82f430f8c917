//! Audit trail writer.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use rpidrive_database::repositories::activity::ActivityRepository;
use rpidrive_entity::activity::ActivityKind;

/// Records administrative actions after they commit.
///
/// A failure to record is logged and swallowed; the action itself already
/// happened.
#[derive(Debug, Clone)]
pub struct ActivityLogger {
    repo: Arc<ActivityRepository>,
}

impl ActivityLogger {
    /// Creates a new activity logger.
    pub fn new(repo: Arc<ActivityRepository>) -> Self {
        Self { repo }
    }

    /// Append an entry.
    pub async fn record(&self, actor_id: Option<i32>, kind: ActivityKind, data: Value) {
        if let Err(e) = self.repo.create(actor_id, kind, &data).await {
            warn!(kind = %kind, error = %e, "Failed to record activity");
        }
    }
}
