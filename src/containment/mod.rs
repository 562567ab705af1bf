//! Containment store.
//!
//! The membership join between a Set's backing identity and its members.
//! A row's presence is the only evidence of membership — there is no
//! cached cardinality or index to keep in sync.
//!
//! This layer performs no existence checks on set or member ids; callers
//! (the set-algebra engine, or the routing layer for direct access)
//! validate before calling.

use hashbrown::HashSet;
use tracing::trace;

use crate::Result;
use crate::model::{Identity, SetId};
use crate::store::{RelationalStore, in_read_tx, in_write_tx};

/// The membership join between Sets and identities.
pub struct ContainmentStore<'a, S: RelationalStore> {
    store: &'a S,
}

impl<'a, S: RelationalStore> ContainmentStore<'a, S> {
    pub(crate) fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Is `member` a member of the set?
    pub fn contains(&self, set: SetId, member: Identity) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            s.containment_exists(tx, set.identity(), member)
        })
    }

    /// True iff every given identity is a member. Vacuously true for an
    /// empty member list.
    pub fn contains_all(&self, set: SetId, members: &[Identity]) -> Result<bool> {
        in_read_tx(self.store, |s, tx| {
            for member in members {
                if !s.containment_exists(tx, set.identity(), *member)? {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    /// All members of the set. Unknown sets yield the empty set.
    pub fn members_of(&self, set: SetId) -> Result<HashSet<Identity>> {
        in_read_tx(self.store, |s, tx| {
            Ok(s.members_of(tx, set.identity())?.into_iter().collect())
        })
    }

    /// Attach a member. Idempotent: adding a present member is a no-op.
    pub fn add(&self, set: SetId, member: Identity) -> Result<()> {
        in_write_tx(self.store, |s, tx| {
            let inserted = s.insert_containment(tx, set.identity(), member)?;
            trace!(set = %set, member = %member, inserted, "containment add");
            Ok(())
        })
    }

    /// Detach a member. Idempotent: removing an absent member is a no-op.
    pub fn remove(&self, set: SetId, member: Identity) -> Result<()> {
        in_write_tx(self.store, |s, tx| {
            let removed = s.delete_containment(tx, set.identity(), member)?;
            trace!(set = %set, member = %member, removed, "containment remove");
            Ok(())
        })
    }

    /// Number of containment rows for the set.
    pub fn count(&self, set: SetId) -> Result<u64> {
        in_read_tx(self.store, |s, tx| s.containment_count(tx, set.identity()))
    }
}
