//! Inventory ledger.
//!
//! Current stock per product is derived from a stream of dated IN/OUT
//! movements. Manual movements can be created, edited and deleted; every edit
//! is applied as the reversal of the old movement followed by the new one, so
//! stock always equals Σ IN − Σ OUT. Movements linked to an invoice are
//! system-derived from paid invoices and cannot be touched manually.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod movement;
pub mod store;

pub use error::{LedgerError, Result};
pub use ledger::{InventoryLedger, LedgerOutcome, MaterializeOutcome, StockLevel};
pub use memory::InMemoryLedgerStore;
pub use movement::{
    InventoryMovement, MovementType, MovementUpdate, NewMovement, StockChange, StockDelta,
};
pub use store::LedgerStore;
