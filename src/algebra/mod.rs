//! Set-algebra engine.
//!
//! Composes containment facts into predicates (subset, equality,
//! disjointness, partition) and into newly materialized Sets (union,
//! intersection, difference, symmetric difference, complement).
//!
//! Every Set-producing operation materializes a brand-new Set: one fresh
//! backing identity plus fresh containment rows, written in a single
//! transaction. Results are independent snapshots, never views — mutating
//! an operand afterwards never changes a previously produced result, and
//! identical-id operands (`union(a, a)`) still produce a new, distinct Set.
//!
//! Cartesian products and n-ary powers are deliberately unsupported: they
//! depend on an ordered-sequence type this model does not have.

use hashbrown::HashSet;
use tracing::debug;

use crate::model::{Identity, SetId};
use crate::store::{RelationalStore, in_read_tx, in_write_tx};
use crate::{Error, Result};

/// Set algebra over containment facts.
pub struct SetAlgebraEngine<'a, S: RelationalStore> {
    store: &'a S,
}

impl<'a, S: RelationalStore> SetAlgebraEngine<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// A new Set with no members.
    pub fn create_empty(&self) -> Result<SetId> {
        in_write_tx(self.store, |s, tx| {
            let id = s.reserve_identities(tx, 1)?;
            debug!(set = %id, "created empty set");
            Ok(SetId(id))
        })
    }

    /// A new Set containing exactly the given members (duplicates
    /// collapse). Every member must exist; all unknown ids are reported in
    /// one error. Empty input yields an empty Set.
    pub fn create_with_members(&self, members: &[Identity]) -> Result<SetId> {
        in_write_tx(self.store, |s, tx| {
            let missing = s.missing_identities(tx, members)?;
            if !missing.is_empty() {
                return Err(Error::UnknownIdentities(missing));
            }
            let members: HashSet<Identity> = members.iter().copied().collect();
            materialize(s, tx, &members)
        })
    }

    /// A new Set with the same members as `set`.
    pub fn copy(&self, set: SetId) -> Result<SetId> {
        in_write_tx(self.store, |s, tx| {
            let members = read_members(s, tx, set)?;
            materialize(s, tx, &members)
        })
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Number of members of the set.
    pub fn cardinality(&self, set: SetId) -> Result<u64> {
        in_read_tx(self.store, |s, tx| s.containment_count(tx, set.identity()))
    }

    /// Has the set no members?
    pub fn is_empty(&self, set: SetId) -> Result<bool> {
        Ok(self.cardinality(set)? == 0)
    }

    /// Are the member sets identical (including both empty)?
    pub fn are_equal(&self, a: SetId, b: SetId) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            Ok(read_members(s, tx, a)? == read_members(s, tx, b)?)
        })
    }

    /// Is every member of `sub` a member of `sup`? Vacuously true when
    /// `sub` is empty.
    pub fn is_subset(&self, sub: SetId, sup: SetId) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            Ok(read_members(s, tx, sub)?.is_subset(&read_members(s, tx, sup)?))
        })
    }

    /// Is the intersection of the two sets empty?
    pub fn are_disjoint(&self, a: SetId, b: SetId) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            Ok(read_members(s, tx, a)?.is_disjoint(&read_members(s, tx, b)?))
        })
    }

    /// True iff no identity occurs as a member of more than one of the
    /// given Sets. Requires at least two inputs.
    pub fn are_disjoint_multiple(&self, sets: &[SetId]) -> Result<bool> {
        require_multi("areDisjointMultiple", sets)?;
        in_read_tx(self.store, |s, tx| pairwise_disjoint(s, tx, sets))
    }

    /// Do `parts` partition `target`?
    ///
    /// True iff the parts are pairwise disjoint (or there is exactly one
    /// part) and their union equals `target`. Zero candidate parts is
    /// rejected as `InvalidArgument`.
    pub fn is_partition(&self, parts: &[SetId], target: SetId) -> Result<bool> {
        if parts.is_empty() {
            return Err(Error::InvalidArgument(
                "isPartition requires at least one candidate part".into(),
            ));
        }
        in_read_tx(self.store, |s, tx| {
            if parts.len() >= 2 && !pairwise_disjoint(s, tx, parts)? {
                return Ok(false);
            }
            let mut union = HashSet::new();
            for part in parts {
                union.extend(read_members(s, tx, *part)?);
            }
            Ok(union == read_members(s, tx, target)?)
        })
    }

    // ========================================================================
    // Materializing operations
    // ========================================================================

    /// A new Set holding the union of the two operands.
    pub fn union(&self, a: SetId, b: SetId) -> Result<SetId> {
        in_write_tx(self.store, |s, tx| {
            let mut members = read_members(s, tx, a)?;
            members.extend(read_members(s, tx, b)?);
            materialize(s, tx, &members)
        })
    }

    /// A new Set holding the union of all operands. Requires at least two.
    pub fn union_multiple(&self, sets: &[SetId]) -> Result<SetId> {
        require_multi("unionMultiple", sets)?;
        in_write_tx(self.store, |s, tx| {
            let mut members = HashSet::new();
            for set in sets {
                members.extend(read_members(s, tx, *set)?);
            }
            materialize(s, tx, &members)
        })
    }

    /// A new Set holding the intersection of the two operands.
    pub fn intersection(&self, a: SetId, b: SetId) -> Result<SetId> {
        in_write_tx(self.store, |s, tx| {
            let lhs = read_members(s, tx, a)?;
            let rhs = read_members(s, tx, b)?;
            let members: HashSet<Identity> = lhs.intersection(&rhs).copied().collect();
            materialize(s, tx, &members)
        })
    }

    /// A new Set holding the members present in **every** operand.
    /// Requires at least two.
    pub fn intersection_multiple(&self, sets: &[SetId]) -> Result<SetId> {
        require_multi("intersectionMultiple", sets)?;
        in_write_tx(self.store, |s, tx| {
            let mut members = read_members(s, tx, sets[0])?;
            for set in &sets[1..] {
                let next = read_members(s, tx, *set)?;
                members.retain(|id| next.contains(id));
            }
            materialize(s, tx, &members)
        })
    }

    /// A new Set holding the members of `a` that are not members of `b`.
    pub fn difference(&self, a: SetId, b: SetId) -> Result<SetId> {
        in_write_tx(self.store, |s, tx| {
            let lhs = read_members(s, tx, a)?;
            let rhs = read_members(s, tx, b)?;
            let members: HashSet<Identity> = lhs.difference(&rhs).copied().collect();
            materialize(s, tx, &members)
        })
    }

    /// A new Set holding `universe \ set`.
    ///
    /// Fails `InvalidArgument` unless `set` is a subset of `universe`.
    pub fn complement(&self, set: SetId, universe: SetId) -> Result<SetId> {
        in_write_tx(self.store, |s, tx| {
            let inner = read_members(s, tx, set)?;
            let outer = read_members(s, tx, universe)?;
            if !inner.is_subset(&outer) {
                return Err(Error::InvalidArgument(format!(
                    "complement requires set {set} to be a subset of universe {universe}"
                )));
            }
            let members: HashSet<Identity> = outer.difference(&inner).copied().collect();
            materialize(s, tx, &members)
        })
    }

    /// A new Set holding the members in exactly one of `a`, `b`.
    pub fn symmetric_difference(&self, a: SetId, b: SetId) -> Result<SetId> {
        in_write_tx(self.store, |s, tx| {
            let lhs = read_members(s, tx, a)?;
            let rhs = read_members(s, tx, b)?;
            let members: HashSet<Identity> =
                lhs.symmetric_difference(&rhs).copied().collect();
            materialize(s, tx, &members)
        })
    }
}

// ============================================================================
// Internals
// ============================================================================

/// Multi-set operations on fewer than two Sets are meaningless.
fn require_multi(op: &str, sets: &[SetId]) -> Result<()> {
    if sets.len() < 2 {
        return Err(Error::InvalidArgument(format!(
            "{op} requires at least 2 sets, got {}",
            sets.len()
        )));
    }
    Ok(())
}

fn read_members<S: RelationalStore>(
    store: &S,
    tx: &S::Tx,
    set: SetId,
) -> Result<HashSet<Identity>> {
    Ok(store.members_of(tx, set.identity())?.into_iter().collect())
}

/// True iff no identity is a member of more than one of the given Sets,
/// counted positionally: passing the same nonempty Set twice is an overlap.
fn pairwise_disjoint<S: RelationalStore>(
    store: &S,
    tx: &S::Tx,
    sets: &[SetId],
) -> Result<bool> {
    let mut seen = HashSet::new();
    for set in sets {
        for member in store.members_of(tx, set.identity())? {
            if !seen.insert(member) {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Materialize a fresh Set: reserve one backing identity and insert all
/// containment rows as one atomic batch.
fn materialize<S: RelationalStore>(
    store: &S,
    tx: &mut S::Tx,
    members: &HashSet<Identity>,
) -> Result<SetId> {
    let id = store.reserve_identities(tx, 1)?;
    let rows: Vec<Identity> = members.iter().copied().collect();
    store.insert_containments(tx, id, &rows)?;
    debug!(set = %id, cardinality = rows.len(), "materialized set");
    Ok(SetId(id))
}
