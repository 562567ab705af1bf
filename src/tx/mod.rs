//! Transaction handles for the relational store.
//!
//! Every facade operation runs inside exactly one transaction: opened
//! against the store, committed on success, rolled back on the first
//! error. The handle itself is deliberately minimal; whether a backend
//! gives real isolation is its own contract (see
//! [`MemoryStore`](crate::MemoryStore) for the reference behavior).

use serde::{Deserialize, Serialize};

/// Whether a transaction may mutate the three tables or only read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Store-assigned transaction number, unique for the store's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

/// Handle returned by [`RelationalStore::begin_tx`](crate::RelationalStore::begin_tx)
/// and consumed by commit or rollback.
pub trait Transaction: Send + Sync {
    fn mode(&self) -> TxMode;
    fn id(&self) -> TxId;
}
