use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Draft, DraftId, DraftStore, DraftStoreError, Result};

#[derive(Default)]
struct InMemoryDraftState {
    drafts: HashMap<DraftId, Draft>,
    saves: usize,
    fail_on_save: bool,
}

/// In-memory draft store implementation for testing.
///
/// Provides the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDraftStore {
    state: Arc<RwLock<InMemoryDraftState>>,
}

impl InMemoryDraftStore {
    /// Creates a new empty in-memory draft store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of drafts stored, completed ones included.
    pub async fn draft_count(&self) -> usize {
        self.state.read().await.drafts.len()
    }

    /// Makes every following `save` call fail until reset.
    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }

    /// Returns how many times `save` has been called.
    pub async fn save_count(&self) -> usize {
        self.state.read().await.saves
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn save(&self, draft: &Draft) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_save {
            return Err(DraftStoreError::Unavailable("save rejected".to_string()));
        }
        state.drafts.insert(draft.id, draft.clone());
        state.saves += 1;
        Ok(())
    }

    async fn load(&self, id: DraftId) -> Result<Option<Draft>> {
        Ok(self.state.read().await.drafts.get(&id).cloned())
    }

    async fn list_pending(&self) -> Result<Vec<Draft>> {
        let state = self.state.read().await;
        let mut drafts: Vec<_> = state
            .drafts
            .values()
            .filter(|d| !d.is_completed())
            .cloned()
            .collect();
        drafts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(drafts)
    }

    async fn delete(&self, id: DraftId) -> Result<()> {
        self.state
            .write()
            .await
            .drafts
            .remove(&id)
            .map(|_| ())
            .ok_or(DraftStoreError::NotFound(id))
    }
}
