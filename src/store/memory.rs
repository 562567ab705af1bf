//! In-memory relational store.
//!
//! This is the reference implementation of `RelationalStore`.
//! It uses hashbrown tables protected by parking_lot RwLocks.
//!
//! ## Limitations
//!
//! - **No real transactions**: `commit_tx()` and `rollback_tx()` are no-ops.
//!   Writes are applied immediately. Rollback does NOT undo mutations.
//!   The component layer preserves all-or-nothing semantics by validating
//!   every batch before its first mutating call and by funnelling each
//!   logical multi-row mutation through a single store method.
//! - **Single-writer only**: per-table locks mean a concurrent reader can
//!   observe a multi-call mutation halfway through. Safe for
//!   single-threaded or read-heavy use only.
//!
//! Use this store for:
//! - Testing the allocator, element store, and algebra engine
//! - Embedding the crate in applications that don't need persistence
//! - Validating correctness before running against a SQL backend

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::RelationalStore;
use crate::model::{GraphElement, Identity};
use crate::tx::{Transaction, TxId, TxMode};
use crate::{Error, Result};

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory three-table store.
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    identities: RwLock<HashSet<Identity>>,
    elements: RwLock<HashMap<Identity, GraphElement>>,
    /// endpoint identity → ids of elements whose a or b equals it
    /// (back-reference index; one entry per referencing element, even when
    /// both endpoints match).
    backrefs: RwLock<HashMap<Identity, SmallVec<[Identity; 2]>>>,
    /// set identity → member identities
    containment: RwLock<HashMap<Identity, HashSet<Identity>>>,
    next_id: AtomicU64,
    next_tx_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                identities: RwLock::new(HashSet::new()),
                elements: RwLock::new(HashMap::new()),
                backrefs: RwLock::new(HashMap::new()),
                containment: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Register `element` in the back-reference index under each of its
/// distinct endpoints.
fn index_backrefs(idx: &mut HashMap<Identity, SmallVec<[Identity; 2]>>, el: &GraphElement) {
    idx.entry(el.a).or_default().push(el.id);
    if el.b != el.a {
        idx.entry(el.b).or_default().push(el.id);
    }
}

/// Remove `element` from the back-reference index.
fn unindex_backrefs(idx: &mut HashMap<Identity, SmallVec<[Identity; 2]>>, el: &GraphElement) {
    for endpoint in [el.a, el.b] {
        if let Some(ids) = idx.get_mut(&endpoint) {
            ids.retain(|eid| *eid != el.id);
            if ids.is_empty() {
                idx.remove(&endpoint);
            }
        }
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction (currently just a marker — no real MVCC).
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode {
        self.mode
    }
    fn id(&self) -> TxId {
        self.id
    }
}

// ============================================================================
// RelationalStore impl
// ============================================================================

impl RelationalStore for MemoryStore {
    type Tx = MemoryTx;

    fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode })
    }

    /// No-op: memory store applies writes immediately, not on commit.
    fn commit_tx(&self, _tx: MemoryTx) -> Result<()> {
        Ok(())
    }

    /// WARNING: No-op. Memory store has no write-ahead log.
    /// Mutations applied during this transaction are NOT reverted.
    fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> {
        Ok(())
    }

    // ========================================================================
    // Identity table
    // ========================================================================

    fn identity_exists(&self, _tx: &MemoryTx, id: Identity) -> Result<bool> {
        Ok(self.inner.identities.read().contains(&id))
    }

    fn missing_identities(&self, _tx: &MemoryTx, ids: &[Identity]) -> Result<Vec<Identity>> {
        let table = self.inner.identities.read();
        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for id in ids {
            if !table.contains(id) && seen.insert(*id) {
                missing.push(*id);
            }
        }
        Ok(missing)
    }

    fn reserve_identities(&self, _tx: &mut MemoryTx, n: u64) -> Result<Identity> {
        // Single fetch-and-add keeps the block contiguous under concurrent
        // reservations.
        let first = self.inner.next_id.fetch_add(n, Ordering::Relaxed);
        let mut table = self.inner.identities.write();
        for i in 0..n {
            table.insert(Identity(first + i));
        }
        Ok(Identity(first))
    }

    fn delete_identity(&self, _tx: &mut MemoryTx, id: Identity) -> Result<bool> {
        Ok(self.inner.identities.write().remove(&id))
    }

    fn identity_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.identities.read().len() as u64)
    }

    fn all_identities(&self, _tx: &MemoryTx) -> Result<Vec<Identity>> {
        let mut ids: Vec<Identity> = self.inner.identities.read().iter().copied().collect();
        ids.sort();
        Ok(ids)
    }

    // ========================================================================
    // Element table
    // ========================================================================

    fn insert_elements(&self, _tx: &mut MemoryTx, rows: &[GraphElement]) -> Result<()> {
        let mut elements = self.inner.elements.write();
        // Validate before touching anything: all rows or none.
        for row in rows {
            if elements.contains_key(&row.id) {
                return Err(Error::Storage(format!(
                    "duplicate element id {} in insert batch",
                    row.id
                )));
            }
        }
        let mut backrefs = self.inner.backrefs.write();
        for row in rows {
            elements.insert(row.id, *row);
            index_backrefs(&mut backrefs, row);
        }
        Ok(())
    }

    fn get_element(&self, _tx: &MemoryTx, id: Identity) -> Result<Option<GraphElement>> {
        Ok(self.inner.elements.read().get(&id).copied())
    }

    fn update_element(
        &self,
        _tx: &mut MemoryTx,
        id: Identity,
        a: Identity,
        b: Identity,
    ) -> Result<bool> {
        let mut elements = self.inner.elements.write();
        let Some(el) = elements.get_mut(&id) else {
            return Ok(false);
        };
        let old = *el;
        el.a = a;
        el.b = b;
        let new = *el;
        drop(elements);

        let mut backrefs = self.inner.backrefs.write();
        unindex_backrefs(&mut backrefs, &old);
        index_backrefs(&mut backrefs, &new);
        Ok(true)
    }

    fn delete_element(&self, _tx: &mut MemoryTx, id: Identity) -> Result<bool> {
        let removed = self.inner.elements.write().remove(&id);
        if let Some(el) = &removed {
            unindex_backrefs(&mut self.inner.backrefs.write(), el);
        }
        Ok(removed.is_some())
    }

    fn referencing_elements(&self, _tx: &MemoryTx, endpoint: Identity) -> Result<Vec<Identity>> {
        let backrefs = self.inner.backrefs.read();
        let mut ids: Vec<Identity> = backrefs
            .get(&endpoint)
            .map(|v| v.to_vec())
            .unwrap_or_default();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn elements_with_endpoint(
        &self,
        _tx: &MemoryTx,
        endpoint: Identity,
    ) -> Result<Vec<GraphElement>> {
        let backrefs = self.inner.backrefs.read();
        let elements = self.inner.elements.read();
        let mut rows: Vec<GraphElement> = backrefs
            .get(&endpoint)
            .into_iter()
            .flatten()
            .filter_map(|id| elements.get(id).copied())
            .collect();
        rows.sort_by_key(|el| el.id);
        rows.dedup();
        Ok(rows)
    }

    fn element_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.elements.read().len() as u64)
    }

    fn all_elements(&self, _tx: &MemoryTx) -> Result<Vec<GraphElement>> {
        let mut rows: Vec<GraphElement> = self.inner.elements.read().values().copied().collect();
        rows.sort_by_key(|el| el.id);
        Ok(rows)
    }

    // ========================================================================
    // Containment table
    // ========================================================================

    fn containment_exists(&self, _tx: &MemoryTx, set: Identity, member: Identity) -> Result<bool> {
        Ok(self
            .inner
            .containment
            .read()
            .get(&set)
            .is_some_and(|members| members.contains(&member)))
    }

    fn insert_containment(
        &self,
        _tx: &mut MemoryTx,
        set: Identity,
        member: Identity,
    ) -> Result<bool> {
        Ok(self
            .inner
            .containment
            .write()
            .entry(set)
            .or_default()
            .insert(member))
    }

    fn insert_containments(
        &self,
        _tx: &mut MemoryTx,
        set: Identity,
        members: &[Identity],
    ) -> Result<()> {
        if members.is_empty() {
            return Ok(());
        }
        let mut table = self.inner.containment.write();
        let rows = table.entry(set).or_default();
        for member in members {
            rows.insert(*member);
        }
        Ok(())
    }

    fn delete_containment(
        &self,
        _tx: &mut MemoryTx,
        set: Identity,
        member: Identity,
    ) -> Result<bool> {
        let mut table = self.inner.containment.write();
        let Some(members) = table.get_mut(&set) else {
            return Ok(false);
        };
        let removed = members.remove(&member);
        if members.is_empty() {
            table.remove(&set);
        }
        Ok(removed)
    }

    fn delete_containments_of(&self, _tx: &mut MemoryTx, set: Identity) -> Result<u64> {
        Ok(self
            .inner
            .containment
            .write()
            .remove(&set)
            .map_or(0, |members| members.len() as u64))
    }

    fn members_of(&self, _tx: &MemoryTx, set: Identity) -> Result<Vec<Identity>> {
        let table = self.inner.containment.read();
        let mut members: Vec<Identity> = table
            .get(&set)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default();
        members.sort();
        Ok(members)
    }

    fn containment_count(&self, _tx: &MemoryTx, set: Identity) -> Result<u64> {
        Ok(self
            .inner
            .containment
            .read()
            .get(&set)
            .map_or(0, |members| members.len() as u64))
    }

    fn all_containments(&self, _tx: &MemoryTx) -> Result<Vec<(Identity, Identity)>> {
        let table = self.inner.containment.read();
        let mut rows: Vec<(Identity, Identity)> = table
            .iter()
            .flat_map(|(set, members)| members.iter().map(|m| (*set, *m)))
            .collect();
        rows.sort();
        Ok(rows)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_is_contiguous() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();

        let first = db.reserve_identities(&mut tx, 4).unwrap();
        for i in 0..4 {
            assert!(db.identity_exists(&tx, first.offset(i)).unwrap());
        }
        let next = db.reserve_identities(&mut tx, 1).unwrap();
        assert_eq!(next, first.offset(4));
    }

    #[test]
    fn missing_identities_dedupes_in_order() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();

        let a = db.reserve_identities(&mut tx, 1).unwrap();
        let ghost1 = Identity(900);
        let ghost2 = Identity(901);
        let missing = db
            .missing_identities(&tx, &[ghost2, a, ghost1, ghost2])
            .unwrap();
        assert_eq!(missing, vec![ghost2, ghost1]);
    }

    #[test]
    fn backref_index_tracks_updates() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();

        let first = db.reserve_identities(&mut tx, 3).unwrap();
        let (x, y, e) = (first, first.offset(1), first.offset(2));
        db.insert_elements(
            &mut tx,
            &[
                GraphElement::new(x, x, x),
                GraphElement::new(y, y, y),
                GraphElement::new(e, x, y),
            ],
        )
        .unwrap();

        assert_eq!(db.referencing_elements(&tx, x).unwrap(), vec![x, e]);

        // Repoint e from (x, y) to a loop on y; x loses the back-reference.
        assert!(db.update_element(&mut tx, e, y, y).unwrap());
        assert_eq!(db.referencing_elements(&tx, x).unwrap(), vec![x]);
        assert_eq!(db.referencing_elements(&tx, y).unwrap(), vec![y, e]);

        assert!(db.delete_element(&mut tx, e).unwrap());
        assert_eq!(db.referencing_elements(&tx, y).unwrap(), vec![y]);
    }

    #[test]
    fn duplicate_insert_batch_is_rejected_whole() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();

        let id = db.reserve_identities(&mut tx, 2).unwrap();
        let other = id.offset(1);
        db.insert_elements(&mut tx, &[GraphElement::new(id, id, id)])
            .unwrap();

        let result = db.insert_elements(
            &mut tx,
            &[GraphElement::new(other, other, other), GraphElement::new(id, id, id)],
        );
        assert!(result.is_err());
        // Nothing from the failed batch landed.
        assert!(db.get_element(&tx, other).unwrap().is_none());
    }

    #[test]
    fn containment_rows_are_unique_per_pair() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();

        let set = db.reserve_identities(&mut tx, 1).unwrap();
        let member = db.reserve_identities(&mut tx, 1).unwrap();

        assert!(db.insert_containment(&mut tx, set, member).unwrap());
        assert!(!db.insert_containment(&mut tx, set, member).unwrap());
        assert_eq!(db.containment_count(&tx, set).unwrap(), 1);

        assert!(db.delete_containment(&mut tx, set, member).unwrap());
        assert!(!db.delete_containment(&mut tx, set, member).unwrap());
        assert_eq!(db.members_of(&tx, set).unwrap(), Vec::<Identity>::new());
    }
}
