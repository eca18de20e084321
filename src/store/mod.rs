//! Vault store abstraction layer.
//!
//! The planner only ever reads snapshots; the write operations exist so a
//! future apply step can act on a computed plan through the same trait.

mod bw;

pub use bw::BwCli;

use thiserror::Error;

use crate::item::VaultItem;

/// Errors surfaced by a vault store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or authentication failure; the store cannot be reached.
    #[error("vault store unavailable: {0}")]
    Unavailable(String),

    /// The store responded with output we could not interpret.
    #[error("unexpected vault store response: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Read/write access to one vault.
pub trait VaultStore: Send + Sync {
    /// Fetch a full snapshot of all items. May be empty.
    fn list_items(&self) -> StoreResult<Vec<VaultItem>>;

    /// Fetch a single item by store-assigned ID.
    fn get_item(&self, id: &str) -> StoreResult<VaultItem>;

    /// Create a new item from a payload and return the stored result.
    fn create_item(&self, item: &VaultItem) -> StoreResult<VaultItem>;

    /// Replace an existing item by ID and return the stored result.
    fn edit_item(&self, id: &str, item: &VaultItem) -> StoreResult<VaultItem>;

    /// Delete an item by ID.
    fn delete_item(&self, id: &str) -> StoreResult<()>;
}
