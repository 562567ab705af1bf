//! Graph element store.
//!
//! Directed relations between identities, stored as `(id, a, b)` triples
//! where `id` is itself an identity. The interesting machinery is the
//! relative-reference batch-creation protocol: one atomic call can build an
//! interconnected mini-graph, with each requested endpoint naming either an
//! existing identity, the element's own not-yet-known id, or another
//! element of the same batch.
//!
//! ## Batch creation
//!
//! 1. Validate every [`EndpointRef::Existing`] against the identity table
//!    and every [`EndpointRef::Relative`] offset against the batch size.
//!    All offenders are reported in one error.
//! 2. Reserve a contiguous block of N identities.
//! 3. Resolve each endpoint: `NewSelf` → the request's own reserved id,
//!    `Relative(n)` → `first_reserved + n`.
//! 4. Insert all N triples in one atomic batch.
//!
//! ## Endpoint protection
//!
//! An element may be deleted only if no *other* surviving element still
//! references it through `a` or `b`. A batched delete validates the whole
//! requested set against the elements that would remain, so deleting a node
//! together with everything that points at it in one call succeeds.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::model::{ElementPattern, ElementSpec, EndpointRef, GraphElement, Identity};
use crate::store::{RelationalStore, in_read_tx, in_write_tx};
use crate::{Error, Result};

// ============================================================================
// Conflict payload
// ============================================================================

/// One endpoint-protection violation inside a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConflict {
    /// The element whose deletion was requested.
    pub element: Identity,
    /// The surviving elements whose `a` or `b` still points at it.
    pub referenced_by: Vec<Identity>,
}

impl std::fmt::Display for EndpointConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "element {} referenced by [", self.element)?;
        for (i, id) in self.referenced_by.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, "]")
    }
}

// ============================================================================
// GraphElementStore
// ============================================================================

/// Directed relations between identities.
pub struct GraphElementStore<'a, S: RelationalStore> {
    store: &'a S,
}

impl<'a, S: RelationalStore> GraphElementStore<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create one element. The N = 1 specialization of [`create_batch`]:
    /// `NewSelf` endpoints are legal (they produce the node and pendant
    /// patterns), `Relative` endpoints are out of block and rejected.
    ///
    /// [`create_batch`]: Self::create_batch
    pub fn create(&self, a: EndpointRef, b: EndpointRef) -> Result<Identity> {
        let ids = self.create_batch(&[ElementSpec::new(a, b)])?;
        Ok(ids[0])
    }

    /// Atomically create a batch of interlinked elements.
    ///
    /// Returns the new ids in request order; they form a contiguous block.
    /// On any invalid reference the whole batch fails and nothing is
    /// created, with every offending reference reported at once.
    pub fn create_batch(&self, specs: &[ElementSpec]) -> Result<Vec<Identity>> {
        if specs.is_empty() {
            return Ok(Vec::new());
        }
        let n = specs.len() as u64;

        in_write_tx(self.store, |s, tx| {
            // Validate before reserving anything: a failed batch must leave
            // no trace, identities included.
            let positives: Vec<Identity> = specs
                .iter()
                .flat_map(|spec| [spec.a, spec.b])
                .filter_map(|r| match r {
                    EndpointRef::Existing(id) => Some(id),
                    _ => None,
                })
                .collect();
            let missing = s.missing_identities(tx, &positives)?;
            if !missing.is_empty() {
                return Err(Error::UnknownIdentities(missing));
            }

            let mut out_of_block: Vec<u64> = specs
                .iter()
                .flat_map(|spec| [spec.a, spec.b])
                .filter_map(|r| match r {
                    EndpointRef::Relative(offset) if offset >= n => Some(offset),
                    _ => None,
                })
                .collect();
            out_of_block.sort_unstable();
            out_of_block.dedup();
            if !out_of_block.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "relative reference offset(s) {out_of_block:?} outside reserved block of size {n}"
                )));
            }

            let first = s.reserve_identities(tx, n)?;
            let rows: Vec<GraphElement> = specs
                .iter()
                .enumerate()
                .map(|(i, spec)| {
                    let id = first.offset(i as u64);
                    let row = GraphElement::new(
                        id,
                        resolve(spec.a, id, first),
                        resolve(spec.b, id, first),
                    );
                    trace!(id = %row.id, a = %row.a, b = %row.b, "resolved element request");
                    row
                })
                .collect();

            s.insert_elements(tx, &rows)?;
            debug!(first = %first, count = rows.len(), "created element batch");
            Ok(rows.iter().map(|row| row.id).collect())
        })
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Replace both endpoints of an existing element.
    ///
    /// Fails `NotFound` when the element is absent and `UnknownIdentities`
    /// when either new endpoint does not exist.
    pub fn update(&self, id: Identity, a: Identity, b: Identity) -> Result<()> {
        in_write_tx(self.store, |s, tx| {
            if s.get_element(tx, id)?.is_none() {
                return Err(Error::NotFound(format!("element {id}")));
            }
            let missing = s.missing_identities(tx, &[a, b])?;
            if !missing.is_empty() {
                return Err(Error::UnknownIdentities(missing));
            }
            s.update_element(tx, id, a, b)?;
            debug!(id = %id, a = %a, b = %b, "replaced element endpoints");
            Ok(())
        })
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete one element, subject to endpoint protection.
    ///
    /// Returns true if the element existed; a nonexistent id is a no-op.
    /// Retires the element's backing identity in the same transaction,
    /// cascading any containment rows keyed by it.
    pub fn delete(&self, id: Identity) -> Result<bool> {
        Ok(self.delete_batch(&[id])? == 1)
    }

    /// Delete several elements in one call.
    ///
    /// Endpoint protection is evaluated against the elements that would
    /// survive: ids inside the requested set never count as blockers.
    /// Violations fail with `EndpointProtected` listing every blocked id
    /// and all of its blockers; in that case nothing is deleted. Absent
    /// ids are no-ops. Returns the number of elements removed.
    pub fn delete_batch(&self, ids: &[Identity]) -> Result<u64> {
        in_write_tx(self.store, |s, tx| {
            let doomed: HashSet<Identity> = ids.iter().copied().collect();

            let mut targets = Vec::with_capacity(doomed.len());
            let mut seen = HashSet::new();
            for id in ids {
                if seen.insert(*id) && s.get_element(tx, *id)?.is_some() {
                    targets.push(*id);
                }
            }

            let mut conflicts = Vec::new();
            for target in &targets {
                let blockers: Vec<Identity> = s
                    .referencing_elements(tx, *target)?
                    .into_iter()
                    .filter(|el| el != target && !doomed.contains(el))
                    .collect();
                if !blockers.is_empty() {
                    conflicts.push(EndpointConflict {
                        element: *target,
                        referenced_by: blockers,
                    });
                }
            }
            if !conflicts.is_empty() {
                return Err(Error::EndpointProtected(conflicts));
            }

            let mut removed = 0;
            for target in &targets {
                if s.delete_element(tx, *target)? {
                    removed += 1;
                }
                // Retiring the backing identity follows the same cascade as
                // the allocator: an element id doubling as a set reference
                // must not leave containment rows behind.
                s.delete_containments_of(tx, *target)?;
                s.delete_identity(tx, *target)?;
            }
            if removed > 0 {
                debug!(removed, "deleted element batch");
            }
            Ok(removed)
        })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Does an element row with this id exist?
    pub fn exists(&self, id: Identity) -> Result<bool> {
        in_read_tx(self.store, |s, tx| Ok(s.get_element(tx, id)?.is_some()))
    }

    /// Fetch an element by id.
    pub fn get(&self, id: Identity) -> Result<Option<GraphElement>> {
        in_read_tx(self.store, |s, tx| s.get_element(tx, id))
    }

    /// Classify an element by the canonical structural patterns.
    /// `None` for absent ids.
    pub fn pattern_of(&self, id: Identity) -> Result<Option<ElementPattern>> {
        in_read_tx(self.store, |s, tx| {
            Ok(s.get_element(tx, id)?.map(|el| el.pattern()))
        })
    }

    /// Is the element a node (`a == b == id`)? Absent ids yield false.
    pub fn is_node(&self, id: Identity) -> Result<bool> {
        self.matches_pattern(id, |p| matches!(p, ElementPattern::Node))
    }

    /// Is the element a pendant hanging off `x`?
    pub fn is_pendant_from(&self, id: Identity, x: Identity) -> Result<bool> {
        self.matches_pattern(id, |p| p == ElementPattern::PendantFrom(x))
    }

    /// Is the element a pendant pointing at `x`?
    pub fn is_pendant_to(&self, id: Identity, x: Identity) -> Result<bool> {
        self.matches_pattern(id, |p| p == ElementPattern::PendantTo(x))
    }

    /// Is the element a loop on `x`?
    pub fn is_loop_on(&self, id: Identity, x: Identity) -> Result<bool> {
        self.matches_pattern(id, |p| p == ElementPattern::LoopOn(x))
    }

    /// Is `id` referenced by some *other* element's `a` or `b`?
    pub fn is_endpoint_of(&self, id: Identity) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            Ok(s.referencing_elements(tx, id)?.iter().any(|el| *el != id))
        })
    }

    fn matches_pattern(
        &self,
        id: Identity,
        pred: impl Fn(ElementPattern) -> bool,
    ) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            Ok(s.get_element(tx, id)?.map(|el| el.pattern()).is_some_and(pred))
        })
    }

    // ========================================================================
    // Batched reads — one bool per input, in input order; absent ids
    // yield false, never an error.
    // ========================================================================

    /// Existence, batched.
    pub fn exist(&self, ids: &[Identity]) -> Result<Vec<bool>> {
        in_read_tx(self.store, |s, tx| {
            ids.iter()
                .map(|id| Ok(s.get_element(tx, *id)?.is_some()))
                .collect()
        })
    }

    /// Node predicate, batched.
    pub fn are_nodes(&self, ids: &[Identity]) -> Result<Vec<bool>> {
        in_read_tx(self.store, |s, tx| {
            ids.iter()
                .map(|id| Ok(s.get_element(tx, *id)?.is_some_and(|el| el.is_node())))
                .collect()
        })
    }

    /// Endpoint predicate, batched.
    pub fn are_endpoints(&self, ids: &[Identity]) -> Result<Vec<bool>> {
        in_read_tx(self.store, |s, tx| {
            ids.iter()
                .map(|id| {
                    Ok(s.referencing_elements(tx, *id)?.iter().any(|el| el != id))
                })
                .collect()
        })
    }

    // ========================================================================
    // Counters
    // ========================================================================

    /// Number of pendants hanging off `x`.
    pub fn count_pendants_from(&self, x: Identity) -> Result<u64> {
        self.count_matching(x, |p| p == ElementPattern::PendantFrom(x))
    }

    /// Number of pendants pointing at `x`.
    pub fn count_pendants_to(&self, x: Identity) -> Result<u64> {
        self.count_matching(x, |p| p == ElementPattern::PendantTo(x))
    }

    /// Number of loops on `x`.
    pub fn count_loops_on(&self, x: Identity) -> Result<u64> {
        self.count_matching(x, |p| p == ElementPattern::LoopOn(x))
    }

    /// Total number of elements.
    pub fn count(&self) -> Result<u64> {
        in_read_tx(self.store, |s, tx| s.element_count(tx))
    }

    fn count_matching(
        &self,
        endpoint: Identity,
        pred: impl Fn(ElementPattern) -> bool,
    ) -> Result<u64> {
        in_read_tx(self.store, |s, tx| {
            Ok(s.elements_with_endpoint(tx, endpoint)?
                .iter()
                .filter(|el| pred(el.pattern()))
                .count() as u64)
        })
    }
}

/// Resolve one endpoint reference against the reserved block.
fn resolve(r: EndpointRef, own: Identity, first: Identity) -> Identity {
    match r {
        EndpointRef::Existing(id) => id,
        EndpointRef::NewSelf => own,
        EndpointRef::Relative(offset) => first.offset(offset),
    }
}
