//! HTTP handlers and the state they share.

pub mod catalog;
pub mod drafts;
pub mod inventory;
pub mod ops;

use std::str::FromStr;

use draft_store::DraftStore;
use ledger::{InventoryLedger, LedgerStore};
use resources::ResourceServices;
use saga::CreationSaga;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<D: DraftStore, L: LedgerStore> {
    pub saga: CreationSaga<D, L>,
}

impl<D: DraftStore, L: LedgerStore> AppState<D, L> {
    pub fn ledger(&self) -> &InventoryLedger<L> {
        self.saga.ledger()
    }

    pub fn resources(&self) -> &ResourceServices {
        self.saga.resources()
    }
}

/// Parses a path segment into a typed id, rejecting malformed input with 400.
pub(crate) fn parse_id<T>(kind: &str, raw: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid {kind} id: {e}")))
}
