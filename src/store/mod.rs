//! # Relational Store Trait
//!
//! This is THE contract between the component layer and any backing store.
//! Three logical tables back the whole model:
//!
//! | Table | Row | Meaning |
//! |---|---|---|
//! | identity | `(id)` | the identity exists |
//! | element | `(id, a, b)` | a directed relation between `a` and `b` |
//! | containment | `(set, member)` | `member ∈ Set(set)` |
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory reference implementation |
//!
//! Every method is a blocking call; multi-row methods (`insert_elements`,
//! `insert_containments`, `delete_containments_of`) apply all of their rows
//! or none. Callers compose them into logical transactions via
//! `begin_tx` / `commit_tx` / `rollback_tx`.

pub mod memory;

use crate::model::{GraphElement, Identity};
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::MemoryStore;

/// The universal storage contract.
///
/// Any store that implements this trait can back the identity allocator,
/// the graph element store, the containment store, and the set-algebra
/// engine. The trait is intentionally flat — one method per relational
/// statement shape, so a SQL-backed implementation maps each method to one
/// parameterized statement.
pub trait RelationalStore: Send + Sync + 'static {
    /// The transaction type for this store.
    type Tx: Transaction;

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Begin a new transaction.
    fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    /// Commit a transaction.
    fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Roll back a transaction.
    fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Identity table
    // ========================================================================

    /// Does the identity row exist?
    fn identity_exists(&self, tx: &Self::Tx, id: Identity) -> Result<bool>;

    /// Of the given ids, the ones with no identity row — deduplicated, in
    /// input order. Empty means all exist.
    fn missing_identities(&self, tx: &Self::Tx, ids: &[Identity]) -> Result<Vec<Identity>>;

    /// Reserve a contiguous block of `n` fresh identities and insert their
    /// rows. Returns the first id of the block; the block is
    /// `first..first + n`.
    ///
    /// The reservation must be atomic with respect to concurrent
    /// reservations: no other caller may observe or receive an id inside
    /// the block. `n == 0` is rejected by callers, not here.
    fn reserve_identities(&self, tx: &mut Self::Tx, n: u64) -> Result<Identity>;

    /// Delete one identity row. Returns true if it existed.
    ///
    /// Row-level only: cascading (containment rows naming this id as their
    /// set) is the caller's explicit, same-transaction responsibility.
    fn delete_identity(&self, tx: &mut Self::Tx, id: Identity) -> Result<bool>;

    /// Total number of identity rows.
    fn identity_count(&self, tx: &Self::Tx) -> Result<u64>;

    /// All identity rows, ascending.
    fn all_identities(&self, tx: &Self::Tx) -> Result<Vec<Identity>>;

    // ========================================================================
    // Element table
    // ========================================================================

    /// Insert a batch of element rows. All rows or none.
    ///
    /// Endpoint validity is the caller's responsibility; the store only
    /// rejects duplicate ids.
    fn insert_elements(&self, tx: &mut Self::Tx, rows: &[GraphElement]) -> Result<()>;

    /// Get an element row by id.
    fn get_element(&self, tx: &Self::Tx, id: Identity) -> Result<Option<GraphElement>>;

    /// Replace the endpoints of an existing element. Returns true if the
    /// row existed.
    fn update_element(
        &self,
        tx: &mut Self::Tx,
        id: Identity,
        a: Identity,
        b: Identity,
    ) -> Result<bool>;

    /// Delete one element row. Returns true if it existed.
    ///
    /// Endpoint protection is enforced by the caller, not here.
    fn delete_element(&self, tx: &mut Self::Tx, id: Identity) -> Result<bool>;

    /// Ids of all elements whose `a` or `b` equals `endpoint`, including an
    /// element whose own id is `endpoint` (callers filter self-references
    /// when they are not of interest).
    fn referencing_elements(&self, tx: &Self::Tx, endpoint: Identity) -> Result<Vec<Identity>>;

    /// Full rows of all elements whose `a` or `b` equals `endpoint`.
    fn elements_with_endpoint(
        &self,
        tx: &Self::Tx,
        endpoint: Identity,
    ) -> Result<Vec<GraphElement>>;

    /// Total number of element rows.
    fn element_count(&self, tx: &Self::Tx) -> Result<u64>;

    /// All element rows, ascending by id.
    fn all_elements(&self, tx: &Self::Tx) -> Result<Vec<GraphElement>>;

    // ========================================================================
    // Containment table
    // ========================================================================

    /// Does the row `(set, member)` exist?
    fn containment_exists(&self, tx: &Self::Tx, set: Identity, member: Identity) -> Result<bool>;

    /// Insert the row `(set, member)`. Returns false if it was already
    /// present (the pair is uniqueness-constrained).
    fn insert_containment(
        &self,
        tx: &mut Self::Tx,
        set: Identity,
        member: Identity,
    ) -> Result<bool>;

    /// Insert many rows for one set. All rows or none; duplicates (in the
    /// input or against existing rows) collapse silently.
    fn insert_containments(
        &self,
        tx: &mut Self::Tx,
        set: Identity,
        members: &[Identity],
    ) -> Result<()>;

    /// Delete the row `(set, member)`. Returns false if it was absent.
    fn delete_containment(
        &self,
        tx: &mut Self::Tx,
        set: Identity,
        member: Identity,
    ) -> Result<bool>;

    /// Delete every row whose set column equals `set`. Returns the number
    /// of rows removed.
    fn delete_containments_of(&self, tx: &mut Self::Tx, set: Identity) -> Result<u64>;

    /// All members of `set`, ascending. Unknown sets yield the empty list.
    fn members_of(&self, tx: &Self::Tx, set: Identity) -> Result<Vec<Identity>>;

    /// Number of rows whose set column equals `set`.
    fn containment_count(&self, tx: &Self::Tx, set: Identity) -> Result<u64>;

    /// Every `(set, member)` row, ascending by set then member.
    fn all_containments(&self, tx: &Self::Tx) -> Result<Vec<(Identity, Identity)>>;
}

// ============================================================================
// Transaction scoping helpers
// ============================================================================

/// Run `f` inside a read-only transaction, committing on success and
/// rolling back on error.
pub(crate) fn in_read_tx<S, T, F>(store: &S, f: F) -> Result<T>
where
    S: RelationalStore,
    F: FnOnce(&S, &S::Tx) -> Result<T>,
{
    let tx = store.begin_tx(TxMode::ReadOnly)?;
    match f(store, &tx) {
        Ok(value) => {
            store.commit_tx(tx)?;
            Ok(value)
        }
        Err(err) => {
            let _ = store.rollback_tx(tx);
            Err(err)
        }
    }
}

/// Run `f` inside a read-write transaction, committing on success and
/// rolling back on error. This is the whole-operation failure boundary:
/// an `Err` from `f` leaves no partial rows visible.
pub(crate) fn in_write_tx<S, T, F>(store: &S, f: F) -> Result<T>
where
    S: RelationalStore,
    F: FnOnce(&S, &mut S::Tx) -> Result<T>,
{
    let mut tx = store.begin_tx(TxMode::ReadWrite)?;
    match f(store, &mut tx) {
        Ok(value) => {
            store.commit_tx(tx)?;
            Ok(value)
        }
        Err(err) => {
            let _ = store.rollback_tx(tx);
            Err(err)
        }
    }
}
