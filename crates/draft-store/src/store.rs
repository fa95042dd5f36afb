use async_trait::async_trait;

use crate::{Draft, DraftId, Result};

/// Persistence for saga drafts, keyed by draft id.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Inserts or replaces the draft.
    async fn save(&self, draft: &Draft) -> Result<()>;

    /// Loads a draft. Returns None if it doesn't exist.
    async fn load(&self, id: DraftId) -> Result<Option<Draft>>;

    /// Lists drafts that have not reached the completed stage,
    /// most recently updated first.
    async fn list_pending(&self) -> Result<Vec<Draft>>;

    /// Discards a draft. Resources it already created are left untouched.
    async fn delete(&self, id: DraftId) -> Result<()>;
}
